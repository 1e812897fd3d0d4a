// src/corpus/records.rs — Newline-delimited JSON record files
//
// One serialized record per line. Reads tolerate malformed lines (skipped
// with a warning) so a partially corrupted dataset still loads. Full
// rewrites go through a temp file + rename so a crash mid-write never
// leaves a half-written store behind.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::infra::errors::CaseforgeError;

/// Read all records from a JSONL file. Missing file yields an empty vec.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CaseforgeError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)?;
    let mut records = Vec::new();

    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    line = lineno + 1,
                    "Skipping malformed record: {}",
                    e
                );
            }
        }
    }

    Ok(records)
}

/// Rewrite the whole file atomically (temp file + rename).
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), CaseforgeError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&parent)?;

    let mut buf = String::new();
    for record in records {
        let line = serde_json::to_string(record)
            .map_err(|e| CaseforgeError::Persistence(format!("serialize record: {}", e)))?;
        buf.push_str(&line);
        buf.push('\n');
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| CaseforgeError::Persistence(format!("not a file path: {}", path.display())))?
        .to_string_lossy();
    let tmp = parent.join(format!(".{}.tmp", file_name));

    let mut f = std::fs::File::create(&tmp)?;
    f.write_all(buf.as_bytes())?;
    f.flush()?;
    f.sync_all()?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Move an existing file aside to `<stem>-backup-<timestamp><ext>`.
///
/// Returns the backup path, or `None` when there was nothing to archive.
pub fn archive_with_timestamp(path: &Path) -> Result<Option<PathBuf>, CaseforgeError> {
    if !path.exists() {
        return Ok(None);
    }

    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let stem = path
        .file_stem()
        .ok_or_else(|| CaseforgeError::Persistence(format!("not a file path: {}", path.display())))?
        .to_string_lossy();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let backup = path.with_file_name(format!("{}-backup-{}{}", stem, timestamp, ext));
    std::fs::rename(path, &backup)?;
    Ok(Some(backup))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Row {
        id: u32,
        text: String,
    }

    fn row(id: u32, text: &str) -> Row {
        Row {
            id,
            text: text.into(),
        }
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let rows: Vec<Row> = read_records(&dir.path().join("nope.jsonl")).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.jsonl");

        write_records(&path, &[row(1, "first"), row(2, "second")]).unwrap();

        let rows: Vec<Row> = read_records(&path).unwrap();
        assert_eq!(rows, vec![row(1, "first"), row(2, "second")]);
    }

    #[test]
    fn test_read_skips_malformed_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.jsonl");

        std::fs::write(
            &path,
            "{\"id\":1,\"text\":\"ok\"}\nnot json at all\n{\"id\":2,\"text\":\"also ok\"}\n",
        )
        .unwrap();

        let rows: Vec<Row> = read_records(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[1].id, 2);
    }

    #[test]
    fn test_read_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.jsonl");

        std::fs::write(&path, "{\"id\":1,\"text\":\"a\"}\n\n\n{\"id\":2,\"text\":\"b\"}\n").unwrap();

        let rows: Vec<Row> = read_records(&path).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_write_records_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.jsonl");

        write_records(&path, &[row(1, "a"), row(2, "b"), row(3, "c")]).unwrap();
        write_records(&path, &[row(9, "only")]).unwrap();

        let rows: Vec<Row> = read_records(&path).unwrap();
        assert_eq!(rows, vec![row(9, "only")]);
    }

    #[test]
    fn test_write_records_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.jsonl");

        write_records(&path, &[row(1, "a")]).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["rows.jsonl".to_string()]);
    }

    #[test]
    fn test_write_records_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/rows.jsonl");

        write_records(&path, &[row(1, "a")]).unwrap();
        let rows: Vec<Row> = read_records(&path).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_archive_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let archived = archive_with_timestamp(&dir.path().join("nope.jsonl")).unwrap();
        assert!(archived.is_none());
    }

    #[test]
    fn test_archive_moves_file_aside() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.jsonl");
        write_records(&path, &[row(1, "a")]).unwrap();

        let backup = archive_with_timestamp(&path).unwrap().unwrap();

        assert!(!path.exists());
        assert!(backup.exists());
        let name = backup.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("results-backup-"));
        assert!(name.ends_with(".jsonl"));

        let rows: Vec<Row> = read_records(&backup).unwrap();
        assert_eq!(rows, vec![row(1, "a")]);
    }
}
