use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};
use tracing::info;

use crate::error::Result;
use crate::model::{format_time, Entry, EntryKind};
use crate::progress::{ProgressReporter, StatusThrottle};
use crate::scanner::{self, ScanFilter};
use crate::utils::path::{base_name, display_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ComparisonStatus {
    Same,
    Modified,
    #[serde(rename = "Only in Left")]
    OnlyInLeft,
    #[serde(rename = "Only in Right")]
    OnlyInRight,
    #[serde(rename = "Type Mismatch")]
    TypeMismatch,
}

/// What one side of a comparison knows about a relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideInfo {
    pub path: PathBuf,
    pub size: Option<u64>,
    pub modified: Option<SystemTime>,
}

impl From<&Entry> for SideInfo {
    fn from(entry: &Entry) -> Self {
        Self {
            path: entry.path.clone(),
            size: entry.size,
            modified: entry.modified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRecord {
    pub relative_path: String,
    pub name: String,
    /// Left side's kind when present, otherwise the right side's.
    pub kind: EntryKind,
    pub status: ComparisonStatus,
    pub detail: String,
    pub left: Option<SideInfo>,
    pub right: Option<SideInfo>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComparisonSummary {
    pub total: usize,
    pub same: usize,
    pub modified: usize,
    pub only_in_left: usize,
    pub only_in_right: usize,
    pub type_mismatch: usize,
}

impl ComparisonSummary {
    pub fn status_total(&self) -> usize {
        self.same + self.modified + self.only_in_left + self.only_in_right + self.type_mismatch
    }
}

/// Diff two trees by relative path. Both roots are walked in full, then
/// the union of their relative paths is classified in sorted order
/// (component by component, so a folder's contents follow the folder).
///
/// A walk cancelled before both trees are known yields no records; a
/// cancel during classification keeps the records already classified.
pub fn compare(
    left: &Path,
    right: &Path,
    reporter: &dyn ProgressReporter,
) -> Result<Vec<ComparisonRecord>> {
    scanner::validate_root(left)?;
    scanner::validate_root(right)?;

    let start = Instant::now();
    let filter = ScanFilter::all();

    let left_walk = scanner::walk(left, &filter, reporter)?;
    if left_walk.cancelled {
        return Ok(Vec::new());
    }
    let right_walk = scanner::walk(right, &filter, reporter)?;
    if right_walk.cancelled {
        return Ok(Vec::new());
    }

    let left_index = index_by_relative_path(left_walk.entries);
    let right_index = index_by_relative_path(right_walk.entries);
    let all_paths: BTreeSet<&PathBuf> = left_index.keys().chain(right_index.keys()).collect();

    let left_name = base_name(left);
    let right_name = base_name(right);
    let mut throttle = StatusThrottle::new(reporter.status_batch());
    let mut records = Vec::with_capacity(all_paths.len());

    for relative_path in all_paths {
        if reporter.is_cancelled() {
            info!("Comparison cancelled after {} records", records.len());
            break;
        }
        if throttle.tick() {
            reporter.report_status(&format!("Comparing {}", display_path(relative_path)));
        }

        let record = match (left_index.get(relative_path), right_index.get(relative_path)) {
            (Some(l), Some(r)) => classify_pair(l, r),
            (Some(l), None) => one_sided(
                l,
                ComparisonStatus::OnlyInLeft,
                format!("Missing from {}", right_name),
            ),
            (None, Some(r)) => one_sided(
                r,
                ComparisonStatus::OnlyInRight,
                format!("Missing from {}", left_name),
            ),
            (None, None) => unreachable!("path came from one of the indexes"),
        };
        records.push(record);
    }

    info!(
        "Compared {} and {} in {:.2}s: {} records",
        left.display(),
        right.display(),
        start.elapsed().as_secs_f64(),
        records.len()
    );
    Ok(records)
}

/// Keyed by the native relative path, so names that only differ in bytes
/// that are not valid UTF-8 stay distinct.
fn index_by_relative_path(entries: Vec<Entry>) -> BTreeMap<PathBuf, Entry> {
    entries
        .into_iter()
        .map(|entry| (entry.relative.clone(), entry))
        .collect()
}

fn classify_pair(left: &Entry, right: &Entry) -> ComparisonRecord {
    let (status, detail) = if left.kind != right.kind {
        (
            ComparisonStatus::TypeMismatch,
            format!(
                "Type changed from {} to {}",
                left.kind.as_str().to_lowercase(),
                right.kind.as_str().to_lowercase()
            ),
        )
    } else if left.kind == EntryKind::File && left.size != right.size {
        // Size first, so a size change is never hidden behind equal timestamps.
        (
            ComparisonStatus::Modified,
            format!(
                "Size changed: {} → {} bytes",
                size_text(left.size),
                size_text(right.size)
            ),
        )
    } else if left.modified != right.modified {
        (
            ComparisonStatus::Modified,
            "Modified time changed".to_string(),
        )
    } else {
        (ComparisonStatus::Same, "Identical".to_string())
    };

    ComparisonRecord {
        relative_path: left.relative_path.clone(),
        name: left.name.clone(),
        kind: left.kind,
        status,
        detail,
        left: Some(SideInfo::from(left)),
        right: Some(SideInfo::from(right)),
    }
}

fn one_sided(entry: &Entry, status: ComparisonStatus, detail: String) -> ComparisonRecord {
    let side = Some(SideInfo::from(entry));
    let (left, right) = match status {
        ComparisonStatus::OnlyInRight => (None, side),
        _ => (side, None),
    };
    ComparisonRecord {
        relative_path: entry.relative_path.clone(),
        name: entry.name.clone(),
        kind: entry.kind,
        status,
        detail,
        left,
        right,
    }
}

fn size_text(size: Option<u64>) -> String {
    size.map(|s| s.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn summarize(records: &[ComparisonRecord]) -> ComparisonSummary {
    let mut summary = ComparisonSummary {
        total: records.len(),
        ..Default::default()
    };

    for record in records {
        match record.status {
            ComparisonStatus::Same => summary.same += 1,
            ComparisonStatus::Modified => summary.modified += 1,
            ComparisonStatus::OnlyInLeft => summary.only_in_left += 1,
            ComparisonStatus::OnlyInRight => summary.only_in_right += 1,
            ComparisonStatus::TypeMismatch => summary.type_mismatch += 1,
        }
    }

    summary
}

/// Flat row written for each comparison record.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRow {
    #[serde(rename = "Relative Path")]
    pub relative_path: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: EntryKind,
    #[serde(rename = "Status")]
    pub status: ComparisonStatus,
    #[serde(rename = "Status Detail")]
    pub detail: String,
    #[serde(rename = "Left Path")]
    pub left_path: String,
    #[serde(rename = "Left Size")]
    pub left_size: Option<u64>,
    #[serde(rename = "Left Modified")]
    pub left_modified: String,
    #[serde(rename = "Right Path")]
    pub right_path: String,
    #[serde(rename = "Right Size")]
    pub right_size: Option<u64>,
    #[serde(rename = "Right Modified")]
    pub right_modified: String,
}

impl From<&ComparisonRecord> for ComparisonRow {
    fn from(record: &ComparisonRecord) -> Self {
        let side_path = |side: &Option<SideInfo>| {
            side.as_ref()
                .map(|s| display_path(&s.path))
                .unwrap_or_default()
        };
        let side_modified =
            |side: &Option<SideInfo>| format_time(side.as_ref().and_then(|s| s.modified));

        Self {
            relative_path: record.relative_path.clone(),
            name: record.name.clone(),
            kind: record.kind,
            status: record.status,
            detail: record.detail.clone(),
            left_path: side_path(&record.left),
            left_size: record.left.as_ref().and_then(|s| s.size),
            left_modified: side_modified(&record.left),
            right_path: side_path(&record.right),
            right_size: record.right.as_ref().and_then(|s| s.size),
            right_modified: side_modified(&record.right),
        }
    }
}

pub fn comparison_rows(records: &[ComparisonRecord]) -> Vec<ComparisonRow> {
    records.iter().map(ComparisonRow::from).collect()
}
