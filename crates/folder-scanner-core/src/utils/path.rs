use std::path::{Component, Path};

/// File name suffix including the dot, as `os.path.splitext` style tools
/// report it: `"archive.tar.gz"` gives `".gz"`, dotfiles such as
/// `".bashrc"` have no extension.
pub fn extension_of(name: &str) -> String {
    let trimmed = name.trim_start_matches('.');
    match trimmed.rfind('.') {
        Some(idx) => trimmed[idx..].to_string(),
        None => String::new(),
    }
}

/// Case-insensitive suffix test against any of `suffixes` (already lower-cased).
pub fn ends_with_any(name: &str, suffixes: &[String]) -> bool {
    let lower = name.to_lowercase();
    suffixes.iter().any(|suffix| lower.ends_with(suffix.as_str()))
}

/// Append `name` to a `/`-joined relative path.
pub fn join_relative(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Path rendered with `/` separators on every platform.
pub fn display_path(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push_str(&prefix.as_os_str().to_string_lossy()),
            Component::RootDir => out.push('/'),
            other => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&other.as_os_str().to_string_lossy());
            }
        }
    }
    out
}

/// Last component of `path` for human-readable messages.
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| display_path(path))
}
