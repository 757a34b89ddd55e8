mod walk;

pub use walk::{scan, validate_root};
pub(crate) use walk::walk;

use std::path::{Path, PathBuf};

/// Which entries a walk reports and which subtrees it never enters.
///
/// Extension and folder-name matching is case-insensitive; values are
/// lower-cased once on construction.
#[derive(Debug, Clone)]
pub struct ScanFilter {
    include_files: bool,
    extensions: Vec<String>,
    excluded_folders: Vec<String>,
    prune_paths: Vec<PathBuf>,
}

impl ScanFilter {
    /// Every folder and every file.
    pub fn all() -> Self {
        Self {
            include_files: true,
            extensions: Vec::new(),
            excluded_folders: Vec::new(),
            prune_paths: Vec::new(),
        }
    }

    pub fn folders_only() -> Self {
        Self {
            include_files: false,
            ..Self::all()
        }
    }

    pub fn include_files(mut self, include: bool) -> Self {
        self.include_files = include;
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = normalize(extensions);
        self
    }

    pub fn with_excluded_folders<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded_folders = normalize(names);
        self
    }

    /// Skip the subtree rooted at `path` (compared against walked paths as given).
    pub fn with_pruned_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.prune_paths.push(path.into());
        self
    }

    pub fn includes_files(&self) -> bool {
        self.include_files
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn excluded_folders(&self) -> &[String] {
        &self.excluded_folders
    }

    /// True when a file named `name` passes the extension filter.
    pub fn accepts_file(&self, name: &str) -> bool {
        self.extensions.is_empty() || crate::utils::path::ends_with_any(name, &self.extensions)
    }

    pub fn is_excluded_folder(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.excluded_folders.iter().any(|excluded| *excluded == lower)
    }

    pub fn is_pruned(&self, path: &Path) -> bool {
        self.prune_paths.iter().any(|pruned| pruned == path)
    }
}

impl Default for ScanFilter {
    fn default() -> Self {
        Self::all()
    }
}

fn normalize<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|value| value.as_ref().trim().to_lowercase())
        .filter(|value| !value.is_empty())
        .collect()
}
