use filetime::FileTime;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{Entry, EntryKind};
use crate::progress::{ProgressReporter, StatusThrottle};
use crate::scanner::{self, ScanFilter};
use crate::utils::path::display_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReplicationStatus {
    #[serde(rename = "Folder Replicated")]
    FolderReplicated,
    #[serde(rename = "Folder Failed")]
    FolderFailed,
    #[serde(rename = "File Copied")]
    FileCopied,
    #[serde(rename = "File Failed")]
    FileFailed,
}

impl ReplicationStatus {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ReplicationStatus::FolderFailed | ReplicationStatus::FileFailed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationRecord {
    pub kind: EntryKind,
    pub name: String,
    pub source_path: PathBuf,
    pub dest_path: PathBuf,
    pub extension: String,
    pub status: ReplicationStatus,
    /// Error text for failed items, empty otherwise.
    pub detail: String,
}

/// Recreate the layout of `source` under `destination`.
///
/// The source is catalogued once with `filter`; that entry list is both
/// the progress denominator and the work list, so exactly one record is
/// produced per catalogued item unless the run is cancelled. Folder
/// creation is idempotent and existing destination files are overwritten.
/// Item failures are recorded and the run carries on.
pub fn replicate(
    source: &Path,
    destination: &Path,
    filter: &ScanFilter,
    reporter: &dyn ProgressReporter,
) -> Result<Vec<ReplicationRecord>> {
    scanner::validate_root(source)?;
    scanner::validate_root(destination)?;

    let filter = prune_nested_destination(source, destination, filter)?;

    let start = Instant::now();
    info!(
        "Replicating {} into {}",
        source.display(),
        destination.display()
    );

    let walk = scanner::walk(source, &filter, reporter)?;
    if walk.cancelled {
        return Ok(Vec::new());
    }

    let total = walk.entries.len();
    let mut throttle = StatusThrottle::new(reporter.status_batch());
    let mut records = Vec::with_capacity(total);

    for entry in &walk.entries {
        if reporter.is_cancelled() {
            info!("Replication cancelled after {} of {} items", records.len(), total);
            break;
        }

        let dest_path = destination.join(&entry.relative);
        if throttle.tick() {
            reporter.report_status(&format!("Replicating {}", display_path(&entry.path)));
        }

        let record = match entry.kind {
            EntryKind::Folder => replicate_folder(entry, dest_path),
            EntryKind::File => replicate_file(entry, dest_path),
        };
        records.push(record);
        reporter.report_progress(records.len() as f64 / total as f64);
    }

    let failures = records.iter().filter(|r| r.status.is_failure()).count();
    info!(
        "Replication finished in {:.2}s: {} items, {} failed",
        start.elapsed().as_secs_f64(),
        records.len(),
        failures
    );
    Ok(records)
}

/// Returns `filter`, extended to skip `destination` when it sits inside
/// `source`, so a run never copies its own output.
fn prune_nested_destination(
    source: &Path,
    destination: &Path,
    filter: &ScanFilter,
) -> Result<ScanFilter> {
    let canonical_source = fs::canonicalize(source)?;
    let canonical_dest = fs::canonicalize(destination)?;

    if canonical_source == canonical_dest {
        return Err(Error::SameLocation(destination.to_path_buf()));
    }

    match canonical_dest.strip_prefix(&canonical_source) {
        Ok(inner) => {
            debug!("Destination is inside source, pruning {}", inner.display());
            Ok(filter.clone().with_pruned_path(source.join(inner)))
        }
        Err(_) => Ok(filter.clone()),
    }
}

fn replicate_folder(entry: &Entry, dest_path: PathBuf) -> ReplicationRecord {
    let (status, detail) = match fs::create_dir_all(&dest_path) {
        Ok(()) => (ReplicationStatus::FolderReplicated, String::new()),
        Err(err) => {
            warn!("Failed to create {}: {}", dest_path.display(), err);
            (ReplicationStatus::FolderFailed, format!("Failed: {}", err))
        }
    };
    record(entry, dest_path, status, detail)
}

fn replicate_file(entry: &Entry, dest_path: PathBuf) -> ReplicationRecord {
    let (status, detail) = match copy_with_times(&entry.path, &dest_path) {
        Ok(bytes) => {
            debug!("Copied {} ({} bytes)", dest_path.display(), bytes);
            (ReplicationStatus::FileCopied, String::new())
        }
        Err(err) => {
            warn!("Failed to copy {}: {}", entry.path.display(), err);
            (ReplicationStatus::FileFailed, format!("Failed: {}", err))
        }
    };
    record(entry, dest_path, status, detail)
}

fn record(
    entry: &Entry,
    dest_path: PathBuf,
    status: ReplicationStatus,
    detail: String,
) -> ReplicationRecord {
    ReplicationRecord {
        kind: entry.kind,
        name: entry.name.clone(),
        source_path: entry.path.clone(),
        dest_path,
        extension: entry.extension.clone(),
        status,
        detail,
    }
}

fn copy_with_times(source: &Path, dest: &Path) -> io::Result<u64> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    remove_read_only(dest)?;
    let bytes = fs::copy(source, dest)?;

    // Timestamps are best-effort; the copy itself already succeeded.
    if let Err(err) = copy_times(source, dest) {
        debug!("Could not stamp times on {}: {}", dest.display(), err);
    }
    Ok(bytes)
}

/// `fs::copy` carries the source permissions over, so a read-only file
/// from an earlier run would refuse to be truncated.
fn remove_read_only(dest: &Path) -> io::Result<()> {
    match fs::symlink_metadata(dest) {
        Ok(metadata) if metadata.is_file() && metadata.permissions().readonly() => {
            debug!("Removing read-only {} before overwrite", dest.display());
            // Windows refuses to delete a file carrying the read-only attribute.
            #[cfg(windows)]
            {
                let mut permissions = metadata.permissions();
                permissions.set_readonly(false);
                fs::set_permissions(dest, permissions)?;
            }
            fs::remove_file(dest)
        }
        _ => Ok(()),
    }
}

/// Stamped by path, so a destination without write permission still gets
/// its times.
fn copy_times(source: &Path, dest: &Path) -> io::Result<()> {
    let metadata = fs::metadata(source)?;
    filetime::set_file_times(
        dest,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )
}

/// Flat row written for each replication record.
#[derive(Debug, Clone, Serialize)]
pub struct ReplicationRow {
    #[serde(rename = "Type")]
    pub kind: EntryKind,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Source Path")]
    pub source_path: String,
    #[serde(rename = "Destination Path")]
    pub dest_path: String,
    #[serde(rename = "Extension")]
    pub extension: String,
    #[serde(rename = "Status")]
    pub status: ReplicationStatus,
    #[serde(rename = "Detail")]
    pub detail: String,
}

impl From<&ReplicationRecord> for ReplicationRow {
    fn from(record: &ReplicationRecord) -> Self {
        Self {
            kind: record.kind,
            name: record.name.clone(),
            source_path: display_path(&record.source_path),
            dest_path: display_path(&record.dest_path),
            extension: record.extension.clone(),
            status: record.status,
            detail: record.detail.clone(),
        }
    }
}

pub fn replication_rows(records: &[ReplicationRecord]) -> Vec<ReplicationRow> {
    records.iter().map(ReplicationRow::from).collect()
}
