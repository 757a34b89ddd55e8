use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::utils::path::display_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntryKind {
    Folder,
    File,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Folder => "Folder",
            EntryKind::File => "File",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One filesystem object discovered during a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub kind: EntryKind,
    pub name: String,
    pub path: PathBuf,
    /// Path from the walk root in native components. Joins and lookups use
    /// this; names that are not valid UTF-8 survive unchanged.
    pub relative: PathBuf,
    /// `relative` rendered with `/` separators, for reports and messages.
    pub relative_path: String,
    /// Suffix including the dot; empty for folders.
    pub extension: String,
    /// `None` for folders and for files whose metadata could not be read.
    pub size: Option<u64>,
    pub modified: Option<SystemTime>,
    pub accessible: bool,
    pub depth: usize,
}

impl Entry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    /// Name of the directory holding this entry, empty for the walk root's children.
    pub fn parent_name(&self) -> &str {
        self.relative_path
            .rsplit_once('/')
            .map(|(parent, _)| parent.rsplit('/').next().unwrap_or(parent))
            .unwrap_or("")
    }
}

/// Flat row written for each catalog entry.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogRow {
    #[serde(rename = "Type")]
    pub kind: EntryKind,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Extension")]
    pub extension: String,
    #[serde(rename = "Parent")]
    pub parent: String,
    #[serde(rename = "Depth")]
    pub depth: usize,
    #[serde(rename = "Size_Bytes")]
    pub size: Option<u64>,
    #[serde(rename = "Modified")]
    pub modified: String,
    #[serde(rename = "Accessible")]
    pub accessible: bool,
}

impl From<&Entry> for CatalogRow {
    fn from(entry: &Entry) -> Self {
        Self {
            kind: entry.kind,
            name: entry.name.clone(),
            path: display_path(&entry.path),
            extension: entry.extension.clone(),
            parent: entry.parent_name().to_string(),
            depth: entry.depth,
            size: entry.size,
            modified: format_time(entry.modified),
            accessible: entry.accessible,
        }
    }
}

pub fn catalog_rows(entries: &[Entry]) -> Vec<CatalogRow> {
    entries.iter().map(CatalogRow::from).collect()
}

/// Local `%Y-%m-%d %H:%M:%S`, or an empty string when unknown.
pub fn format_time(time: Option<SystemTime>) -> String {
    time.map(|t| {
        DateTime::<Local>::from(t)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    })
    .unwrap_or_default()
}
