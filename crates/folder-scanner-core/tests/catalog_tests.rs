use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::tempdir;

use folder_scanner_core::scanner::{scan, ScanFilter};
use folder_scanner_core::{CancelFlag, EntryKind, Error, ProgressReporter, SilentReporter};

/// Layout:
///   root/
///     file1.txt        ("Hello")
///     file2.pdf        ("PDF content")
///     subfolder1/
///       file3.docx     ("DOCX content")
///       nested/
///         deep.TXT     ("deep")
///     subfolder2/
///       empty.txt      ("")
fn create_test_tree(root: &Path) {
    fs::create_dir_all(root.join("subfolder1").join("nested")).unwrap();
    fs::create_dir_all(root.join("subfolder2")).unwrap();
    fs::write(root.join("file1.txt"), "Hello").unwrap();
    fs::write(root.join("file2.pdf"), "PDF content").unwrap();
    fs::write(root.join("subfolder1").join("file3.docx"), "DOCX content").unwrap();
    fs::write(root.join("subfolder1").join("nested").join("deep.TXT"), "deep").unwrap();
    fs::write(root.join("subfolder2").join("empty.txt"), "").unwrap();
}

#[derive(Default)]
struct RecordingReporter {
    statuses: Mutex<Vec<String>>,
    polls: AtomicUsize,
    cancel_after: Option<usize>,
    batch: Option<usize>,
}

impl RecordingReporter {
    fn cancelling_after(polls: usize) -> Self {
        Self {
            cancel_after: Some(polls),
            ..Default::default()
        }
    }
}

impl ProgressReporter for RecordingReporter {
    fn report_status(&self, text: &str) {
        self.statuses.lock().unwrap().push(text.to_string());
    }

    fn is_cancelled(&self) -> bool {
        let polls = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        self.cancel_after.map(|limit| polls > limit).unwrap_or(false)
    }

    fn status_batch(&self) -> usize {
        self.batch.unwrap_or(folder_scanner_core::progress::DEFAULT_STATUS_BATCH)
    }
}

#[test]
fn test_catalog_completeness() {
    let tmp = tempdir().unwrap();
    create_test_tree(tmp.path());

    let entries = scan(tmp.path(), &ScanFilter::all(), &SilentReporter).unwrap();

    // 3 folders + 5 files
    assert_eq!(entries.len(), 8);
    let folders = entries.iter().filter(|e| e.kind == EntryKind::Folder).count();
    assert_eq!(folders, 3);

    let unique_paths: HashSet<_> = entries.iter().map(|e| e.path.clone()).collect();
    assert_eq!(unique_paths.len(), entries.len());
    let unique_relative: HashSet<_> = entries.iter().map(|e| e.relative_path.clone()).collect();
    assert_eq!(unique_relative.len(), entries.len());

    for entry in &entries {
        let rebuilt = entry
            .relative_path
            .split('/')
            .fold(tmp.path().to_path_buf(), |acc, part| acc.join(part));
        assert_eq!(rebuilt, entry.path);
        assert_eq!(entry.depth, entry.relative_path.split('/').count());
        assert!(entry.accessible);
    }
}

#[test]
fn test_empty_root_has_no_entries() {
    let tmp = tempdir().unwrap();
    let entries = scan(tmp.path(), &ScanFilter::all(), &SilentReporter).unwrap();
    assert!(entries.is_empty());
}

#[test]
fn test_folders_only_by_default_filter() {
    let tmp = tempdir().unwrap();
    create_test_tree(tmp.path());

    let entries = scan(tmp.path(), &ScanFilter::folders_only(), &SilentReporter).unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.kind == EntryKind::Folder));

    let depths: Vec<(String, usize)> = entries
        .iter()
        .map(|e| (e.name.clone(), e.depth))
        .collect();
    assert!(depths.contains(&("nested".to_string(), 2)));
    assert!(depths.contains(&("subfolder1".to_string(), 1)));
}

#[test]
fn test_children_reported_before_descent() {
    let tmp = tempdir().unwrap();
    create_test_tree(tmp.path());

    let entries = scan(tmp.path(), &ScanFilter::all(), &SilentReporter).unwrap();
    let position = |relative: &str| {
        entries
            .iter()
            .position(|e| e.relative_path == relative)
            .unwrap_or_else(|| panic!("{} not catalogued", relative))
    };

    // Every direct child of the root precedes every grandchild.
    let top_level = ["subfolder1", "subfolder2", "file1.txt", "file2.pdf"];
    let nested = ["subfolder1/file3.docx", "subfolder1/nested", "subfolder2/empty.txt"];
    let last_top = top_level.iter().map(|p| position(p)).max().unwrap();
    let first_nested = nested.iter().map(|p| position(p)).min().unwrap();
    assert!(last_top < first_nested);

    // Within a directory, folders come before files.
    assert!(position("subfolder1") < position("file1.txt"));
    assert!(position("subfolder2") < position("file2.pdf"));
    assert!(position("subfolder1/nested") < position("subfolder1/file3.docx"));

    // Parent before child.
    assert!(position("subfolder1/nested") < position("subfolder1/nested/deep.TXT"));
}

#[test]
fn test_exclusion_prunes_subtree_case_insensitively() {
    let tmp = tempdir().unwrap();
    create_test_tree(tmp.path());
    fs::create_dir_all(tmp.path().join("temp").join("inner")).unwrap();
    fs::write(tmp.path().join("temp").join("inner").join("junk.txt"), "x").unwrap();

    let filter = ScanFilter::all().with_excluded_folders(["Temp", "SUBFOLDER1"]);
    let entries = scan(tmp.path(), &filter, &SilentReporter).unwrap();

    for entry in &entries {
        assert!(!entry.relative_path.starts_with("temp"), "{}", entry.relative_path);
        assert!(!entry.relative_path.starts_with("subfolder1"), "{}", entry.relative_path);
    }
    // subfolder2, subfolder2/empty.txt, file1.txt, file2.pdf
    assert_eq!(entries.len(), 4);
}

#[test]
fn test_exclusion_applies_at_any_depth() {
    let tmp = tempdir().unwrap();
    create_test_tree(tmp.path());

    let filter = ScanFilter::all().with_excluded_folders(["nested"]);
    let entries = scan(tmp.path(), &filter, &SilentReporter).unwrap();
    assert!(entries.iter().all(|e| !e.relative_path.contains("nested")));
    assert_eq!(entries.len(), 6);
}

#[test]
fn test_extension_filter_only_affects_files() {
    let tmp = tempdir().unwrap();
    create_test_tree(tmp.path());

    let filter = ScanFilter::all().with_extensions([".txt"]);
    let entries = scan(tmp.path(), &filter, &SilentReporter).unwrap();

    let files: HashSet<String> = entries
        .iter()
        .filter(|e| e.kind == EntryKind::File)
        .map(|e| e.name.clone())
        .collect();
    let expected: HashSet<String> = ["file1.txt", "deep.TXT", "empty.txt"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(files, expected);

    let folders = entries.iter().filter(|e| e.kind == EntryKind::Folder).count();
    assert_eq!(folders, 3);
}

#[test]
fn test_folder_and_empty_file_sizes_stay_distinct() {
    let tmp = tempdir().unwrap();
    create_test_tree(tmp.path());

    let entries = scan(tmp.path(), &ScanFilter::all(), &SilentReporter).unwrap();
    let empty = entries.iter().find(|e| e.name == "empty.txt").unwrap();
    let folder = entries.iter().find(|e| e.name == "subfolder2").unwrap();

    assert_eq!(empty.size, Some(0));
    assert_eq!(empty.extension, ".txt");
    assert_eq!(folder.size, None);
    assert_eq!(folder.extension, "");
    assert!(folder.modified.is_some());
}

#[test]
fn test_missing_root_is_not_found() {
    let tmp = tempdir().unwrap();
    let missing = tmp.path().join("does_not_exist");
    match scan(&missing, &ScanFilter::all(), &SilentReporter) {
        Err(Error::NotFound(path)) => assert_eq!(path, missing),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_file_root_is_rejected() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("plain.txt");
    fs::write(&file, "x").unwrap();
    assert!(matches!(
        scan(&file, &ScanFilter::all(), &SilentReporter),
        Err(Error::NotADirectory(_))
    ));
}

#[test]
fn test_status_is_reported_and_cancellation_polled() {
    let tmp = tempdir().unwrap();
    create_test_tree(tmp.path());

    let reporter = RecordingReporter::default();
    let entries = scan(tmp.path(), &ScanFilter::all(), &reporter).unwrap();

    assert_eq!(entries.len(), 8);
    assert!(!reporter.statuses.lock().unwrap().is_empty());
    assert!(reporter.polls.load(Ordering::SeqCst) >= entries.len());
}

#[test]
fn test_cancellation_returns_partial_result() {
    let tmp = tempdir().unwrap();
    create_test_tree(tmp.path());

    let full = scan(tmp.path(), &ScanFilter::all(), &SilentReporter).unwrap();
    let reporter = RecordingReporter::cancelling_after(2);
    let partial = scan(tmp.path(), &ScanFilter::all(), &reporter).unwrap();

    assert!(partial.len() <= 2);
    assert!(partial.len() < full.len());
    // Whatever was produced is a prefix of the full walk.
    for (got, expected) in partial.iter().zip(full.iter()) {
        assert_eq!(got, expected);
    }
}

#[test]
fn test_cancelled_before_start_returns_nothing() {
    let tmp = tempdir().unwrap();
    create_test_tree(tmp.path());

    let reporter = RecordingReporter::cancelling_after(0);
    let entries = scan(tmp.path(), &ScanFilter::all(), &reporter).unwrap();
    assert!(entries.is_empty());
}

#[cfg(unix)]
#[test]
fn test_symlinked_directory_is_listed_but_not_followed() {
    let tmp = tempdir().unwrap();
    create_test_tree(tmp.path());
    std::os::unix::fs::symlink(tmp.path().join("subfolder1"), tmp.path().join("link")).unwrap();

    let entries = scan(tmp.path(), &ScanFilter::all(), &SilentReporter).unwrap();
    let link = entries.iter().find(|e| e.name == "link").unwrap();
    assert_eq!(link.kind, EntryKind::Folder);
    assert!(entries.iter().all(|e| !e.relative_path.starts_with("link/")));
}

#[cfg(unix)]
#[test]
fn test_broken_symlink_is_reported_inaccessible() {
    let tmp = tempdir().unwrap();
    std::os::unix::fs::symlink(tmp.path().join("gone"), tmp.path().join("dangling")).unwrap();

    let entries = scan(tmp.path(), &ScanFilter::all(), &SilentReporter).unwrap();
    assert_eq!(entries.len(), 1);
    let dangling = &entries[0];
    assert_eq!(dangling.kind, EntryKind::File);
    assert!(!dangling.accessible);
    assert_eq!(dangling.size, None);
    assert_eq!(dangling.modified, None);
}

#[test]
fn test_status_batch_controls_status_lines() {
    let tmp = tempdir().unwrap();
    create_test_tree(tmp.path());

    let every_item = RecordingReporter {
        batch: Some(1),
        ..Default::default()
    };
    let entries = scan(tmp.path(), &ScanFilter::all(), &every_item).unwrap();
    // One line for the root, then one per entry.
    assert_eq!(every_item.statuses.lock().unwrap().len(), entries.len() + 1);

    let batched = RecordingReporter {
        batch: Some(3),
        ..Default::default()
    };
    scan(tmp.path(), &ScanFilter::all(), &batched).unwrap();
    // Entries 1, 4 and 7 of 8.
    assert_eq!(batched.statuses.lock().unwrap().len(), 1 + 3);
}

#[cfg(unix)]
#[test]
fn test_unreadable_subfolder_counts_as_empty() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempdir().unwrap();
    create_test_tree(tmp.path());
    let locked = tmp.path().join("subfolder1");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Permission bits do not bind a privileged user.
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = scan(tmp.path(), &ScanFilter::all(), &SilentReporter);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    let entries = result.unwrap();

    let relative: Vec<&str> = entries.iter().map(|e| e.relative_path.as_str()).collect();
    assert!(relative.contains(&"subfolder1"));
    assert!(relative.contains(&"subfolder2"));
    assert!(relative.contains(&"subfolder2/empty.txt"));
    assert!(relative.contains(&"file1.txt"));
    assert!(entries.iter().all(|e| !e.relative_path.starts_with("subfolder1/")));
    assert_eq!(entries.len(), 5);
}

#[test]
fn test_attached_flag_cancels_while_status_passes_through() {
    let tmp = tempdir().unwrap();
    create_test_tree(tmp.path());

    let reporter = RecordingReporter::default();
    let flag = CancelFlag::new();
    let attached = flag.attach(&reporter);

    let entries = scan(tmp.path(), &ScanFilter::all(), &attached).unwrap();
    assert_eq!(entries.len(), 8);

    flag.cancel();
    let entries = scan(tmp.path(), &ScanFilter::all(), &attached).unwrap();
    assert!(entries.is_empty());
    // Both walks announced their root through the wrapped reporter.
    assert!(reporter.statuses.lock().unwrap().len() >= 2);
}
