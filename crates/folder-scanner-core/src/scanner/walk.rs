use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::ScanFilter;
use crate::error::{Error, Result};
use crate::model::{Entry, EntryKind};
use crate::progress::{ProgressReporter, StatusThrottle};
use crate::utils::path::{display_path, extension_of, join_relative};

/// Entries gathered by one walk, and whether it stopped early.
#[derive(Debug, Default)]
pub(crate) struct Walk {
    pub entries: Vec<Entry>,
    pub cancelled: bool,
}

/// Fail fast when `path` is missing or is not a directory.
pub fn validate_root(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(Error::NotADirectory(path.to_path_buf())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(Error::NotFound(path.to_path_buf()))
        }
        Err(err) => Err(Error::Io(err)),
    }
}

/// Catalog `root`: every live folder (and, when the filter includes
/// files, every accepted file) in discovery order.
///
/// Each directory's child folders are reported, then its files, before
/// any of those folders is entered. Excluded folders are never listed.
/// A cancelled walk returns the entries found so far.
pub fn scan(
    root: &Path,
    filter: &ScanFilter,
    reporter: &dyn ProgressReporter,
) -> Result<Vec<Entry>> {
    walk(root, filter, reporter).map(|walk| walk.entries)
}

pub(crate) fn walk(
    root: &Path,
    filter: &ScanFilter,
    reporter: &dyn ProgressReporter,
) -> Result<Walk> {
    validate_root(root)?;

    let start = Instant::now();
    info!("Scanning {}", root.display());
    reporter.report_status(&format!("Scanning {}", display_path(root)));

    let mut walker = Walker {
        filter,
        reporter,
        throttle: StatusThrottle::new(reporter.status_batch()),
        walk: Walk::default(),
    };

    // Only the root's own listing failure is fatal.
    let children = list_children(root).map_err(|err| {
        warn!("Unable to read root {}: {}", root.display(), err);
        Error::Io(err)
    })?;
    walker.visit(children, Path::new(""), "", 1);

    let walk = walker.walk;
    info!(
        "Scan of {} {} in {:.2}s: {} entries",
        root.display(),
        if walk.cancelled { "cancelled" } else { "completed" },
        start.elapsed().as_secs_f64(),
        walk.entries.len(),
    );
    Ok(walk)
}

struct Child {
    file_name: OsString,
    /// Lossy form of `file_name` for matching and display.
    name: String,
    path: PathBuf,
    is_dir: bool,
    is_symlink: bool,
}

fn list_children(dir: &Path) -> io::Result<Vec<Child>> {
    let mut children = Vec::new();
    for entry_result in fs::read_dir(dir)? {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                debug!("Skipping unreadable entry in {}: {}", dir.display(), err);
                continue;
            }
        };

        let path = entry.path();
        let (is_dir, is_symlink) = match entry.file_type() {
            Ok(file_type) if file_type.is_symlink() => (path.is_dir(), true),
            Ok(file_type) => (file_type.is_dir(), false),
            Err(_) => (path.is_dir(), false),
        };

        let file_name = entry.file_name();
        children.push(Child {
            name: file_name.to_string_lossy().into_owned(),
            file_name,
            path,
            is_dir,
            is_symlink,
        });
    }
    Ok(children)
}

struct Walker<'a> {
    filter: &'a ScanFilter,
    reporter: &'a dyn ProgressReporter,
    throttle: StatusThrottle,
    walk: Walk,
}

impl Walker<'_> {
    fn visit(
        &mut self,
        children: Vec<Child>,
        relative: &Path,
        relative_path: &str,
        depth: usize,
    ) {
        let (folders, files): (Vec<Child>, Vec<Child>) =
            children.into_iter().partition(|child| child.is_dir);

        // Live subfolders are fixed here, before any of them is entered.
        let mut descend: Vec<(PathBuf, PathBuf, String)> = Vec::new();
        for folder in folders {
            if self.should_stop() {
                return;
            }
            if self.filter.is_excluded_folder(&folder.name) || self.filter.is_pruned(&folder.path)
            {
                debug!("Pruning {}", folder.path.display());
                continue;
            }

            let child_relative = relative.join(&folder.file_name);
            let child_relative_path = join_relative(relative_path, &folder.name);
            if !folder.is_symlink {
                descend.push((
                    folder.path.clone(),
                    child_relative.clone(),
                    child_relative_path.clone(),
                ));
            }
            self.push(make_entry(
                folder,
                EntryKind::Folder,
                child_relative,
                child_relative_path,
                depth,
            ));
        }

        if self.filter.includes_files() {
            for file in files {
                if self.should_stop() {
                    return;
                }
                if !self.filter.accepts_file(&file.name) {
                    continue;
                }
                let child_relative = relative.join(&file.file_name);
                let child_relative_path = join_relative(relative_path, &file.name);
                self.push(make_entry(
                    file,
                    EntryKind::File,
                    child_relative,
                    child_relative_path,
                    depth,
                ));
            }
        }

        for (path, child_relative, child_relative_path) in descend {
            if self.should_stop() {
                return;
            }
            match list_children(&path) {
                Ok(children) => {
                    self.visit(children, &child_relative, &child_relative_path, depth + 1)
                }
                Err(err) => warn!("Unable to read directory {}: {}", path.display(), err),
            }
        }
    }

    fn push(&mut self, entry: Entry) {
        if self.throttle.tick() {
            self.reporter
                .report_status(&format!("Scanning {}", display_path(&entry.path)));
        }
        self.walk.entries.push(entry);
    }

    fn should_stop(&mut self) -> bool {
        if !self.walk.cancelled && self.reporter.is_cancelled() {
            info!("Scan cancelled after {} entries", self.walk.entries.len());
            self.walk.cancelled = true;
        }
        self.walk.cancelled
    }
}

fn make_entry(
    child: Child,
    kind: EntryKind,
    relative: PathBuf,
    relative_path: String,
    depth: usize,
) -> Entry {
    let extension = match kind {
        EntryKind::File => extension_of(&child.name),
        EntryKind::Folder => String::new(),
    };

    let (size, modified, accessible) = match fs::metadata(&child.path) {
        Ok(metadata) => {
            let size = match kind {
                EntryKind::File => Some(metadata.len()),
                EntryKind::Folder => None,
            };
            (size, metadata.modified().ok(), true)
        }
        Err(err) => {
            debug!("Metadata unavailable for {}: {}", child.path.display(), err);
            (None, None, false)
        }
    };

    Entry {
        kind,
        name: child.name,
        path: child.path,
        relative,
        relative_path,
        extension,
        size,
        modified,
        accessible,
        depth,
    }
}
