use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info};

use crate::hasher;
use crate::model::{Entry, EntryKind};
use crate::progress::ProgressReporter;
use crate::utils::path::display_path;

/// How files are judged "the same".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateStrategy {
    /// BLAKE3 digest of the full contents.
    Content,
    /// Case-folded base name only. A fast heuristic, not a content guarantee.
    Name,
}

impl DuplicateStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicateStrategy::Content => "content",
            DuplicateStrategy::Name => "name",
        }
    }
}

impl fmt::Display for DuplicateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub key: String,
    pub members: Vec<Entry>,
}

impl DuplicateGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Size of the first member encountered.
    pub fn representative_size(&self) -> u64 {
        self.members
            .first()
            .and_then(|member| member.size)
            .unwrap_or(0)
    }

    /// Bytes held by every member except the largest one. Equals
    /// `(len - 1) * size` when all members share a size.
    pub fn wasted_bytes(&self) -> u64 {
        let sizes = self.members.iter().map(|member| member.size.unwrap_or(0));
        let total: u64 = sizes.clone().sum();
        let largest = sizes.max().unwrap_or(0);
        total - largest
    }
}

/// Group the file entries of `entries` by `strategy`, keeping only keys
/// shared by two or more files. Groups appear in the order their key was
/// first seen; members keep catalog order.
///
/// Folders and inaccessible entries never take part. Files that cannot be
/// read are left out of content grouping. A cancelled run groups whatever
/// was keyed before the cancel.
pub fn find_duplicates(
    entries: &[Entry],
    strategy: DuplicateStrategy,
    reporter: &dyn ProgressReporter,
) -> Vec<DuplicateGroup> {
    let start = Instant::now();
    let files: Vec<&Entry> = entries
        .iter()
        .filter(|entry| entry.is_file() && entry.accessible)
        .collect();
    info!(
        "Finding duplicates among {} files by {}",
        files.len(),
        strategy
    );

    let keys: Vec<Option<String>> = match strategy {
        DuplicateStrategy::Content => hash_all(&files, reporter),
        DuplicateStrategy::Name => files
            .iter()
            .map(|entry| {
                if reporter.is_cancelled() {
                    None
                } else {
                    Some(entry.name.to_lowercase())
                }
            })
            .collect(),
    };

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();
    for (entry, key) in files.into_iter().zip(keys) {
        let Some(key) = key else {
            continue;
        };
        match index.get(&key) {
            Some(&slot) => groups[slot].members.push(entry.clone()),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(DuplicateGroup {
                    key,
                    members: vec![entry.clone()],
                });
            }
        }
    }
    groups.retain(|group| group.len() > 1);

    info!(
        "Duplicate search completed in {:.2}s: {} groups",
        start.elapsed().as_secs_f64(),
        groups.len()
    );
    groups
}

fn hash_all(files: &[&Entry], reporter: &dyn ProgressReporter) -> Vec<Option<String>> {
    let total = files.len();
    let batch = reporter.status_batch().max(1);
    let done = AtomicUsize::new(0);

    files
        .par_iter()
        .map(|entry| {
            if reporter.is_cancelled() {
                return None;
            }
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            if (finished - 1) % batch == 0 {
                reporter.report_status(&format!("Hashing {}", display_path(&entry.path)));
            }

            let key = match hasher::content_hash(&entry.path) {
                Ok(hash) => Some(hash),
                Err(e) => {
                    debug!("Skipping unreadable file {}: {}", entry.path.display(), e);
                    None
                }
            };
            reporter.report_progress(finished as f64 / total as f64);
            key
        })
        .collect()
}

/// Flat row written for each duplicate group member.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateRow {
    #[serde(rename = "Duplicate_Group")]
    pub group_id: usize,
    #[serde(rename = "File_Number")]
    pub member_index: usize,
    #[serde(rename = "Total_in_Group")]
    pub total_in_group: usize,
    #[serde(rename = "Type")]
    pub kind: EntryKind,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Extension")]
    pub extension: String,
    #[serde(rename = "Size_Bytes")]
    pub size: Option<u64>,
    #[serde(rename = "Key")]
    pub key: String,
}

pub fn format_for_export(groups: &[DuplicateGroup]) -> Vec<DuplicateRow> {
    groups
        .iter()
        .enumerate()
        .flat_map(|(group_idx, group)| {
            group
                .members
                .iter()
                .enumerate()
                .map(move |(member_idx, member)| DuplicateRow {
                    group_id: group_idx + 1,
                    member_index: member_idx + 1,
                    total_in_group: group.len(),
                    kind: member.kind,
                    name: member.name.clone(),
                    path: display_path(&member.path),
                    extension: member.extension.clone(),
                    size: member.size,
                    key: group.key.clone(),
                })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuplicateStats {
    pub total_duplicate_files: usize,
    pub total_groups: usize,
    pub wasted_bytes: u64,
}

impl DuplicateStats {
    /// Wasted space in MiB rounded to two decimals.
    pub fn wasted_megabytes(&self) -> f64 {
        let mb = self.wasted_bytes as f64 / (1024.0 * 1024.0);
        (mb * 100.0).round() / 100.0
    }
}

pub fn statistics(groups: &[DuplicateGroup]) -> DuplicateStats {
    DuplicateStats {
        total_duplicate_files: groups.iter().map(DuplicateGroup::len).sum(),
        total_groups: groups.len(),
        wasted_bytes: groups.iter().map(DuplicateGroup::wasted_bytes).sum(),
    }
}
