use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::Result;

/// Write `rows` to `path` as CSV: one header row of column names, then one
/// line per record. The header comes from the first record, so an empty
/// slice leaves an empty file. Parent directories are created as needed.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntryKind;
    use tempfile::tempdir;

    #[derive(Serialize)]
    struct Row {
        #[serde(rename = "Type")]
        kind: EntryKind,
        #[serde(rename = "Size_Bytes")]
        size: Option<u64>,
    }

    #[test]
    fn test_write_csv_header_and_blank_optionals() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("reports").join("out.csv");
        let rows = vec![
            Row { kind: EntryKind::Folder, size: None },
            Row { kind: EntryKind::File, size: Some(0) },
        ];

        let written = write_csv(&path, &rows).unwrap();
        assert_eq!(written, 2);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["Type,Size_Bytes", "Folder,", "File,0"]);
    }
}
