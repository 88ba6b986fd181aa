//! Versioned JSON records with atomic writes

use confbook_core::error::{ConfbookError, Result};
use confbook_core::types::SchemaVersion;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Current schema version of stored records
pub const CURRENT_SCHEMA_VERSION: &str = "1.0";

/// On-disk wrapper carrying the schema version
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Record<T> {
    pub schema_version: String,
    pub data: T,
}

/// Ensure a directory exists
pub(crate) fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| {
            ConfbookError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create directory {:?}: {}", dir, e),
            ))
        })?;
        debug!("Created directory: {:?}", dir);
    }
    Ok(())
}

/// Write a record atomically (write to temp, then rename)
pub(crate) fn write_record<T: Serialize>(dir: &Path, name: &str, data: &T) -> Result<PathBuf> {
    let temp_path = dir.join(format!(".{}.json.tmp", name));
    let final_path = dir.join(format!("{}.json", name));

    let record = Record {
        schema_version: CURRENT_SCHEMA_VERSION.to_string(),
        data,
    };

    let temp_file = fs::File::create(&temp_path).map_err(|e| {
        ConfbookError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to create temp file: {}", e),
        ))
    })?;
    let mut writer = BufWriter::new(temp_file);
    serde_json::to_writer_pretty(&mut writer, &record)?;
    writer.flush()?;

    // Rename to final path (atomic on most filesystems)
    fs::rename(&temp_path, &final_path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        ConfbookError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to rename temp file: {}", e),
        ))
    })?;

    debug!("Wrote {:?}", final_path);
    Ok(final_path)
}

/// Read a record, checking its schema version
///
/// A missing file is reported as `Ok(None)`.
pub(crate) fn read_record<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ConfbookError::Io(e)),
    };

    let record: Record<T> = serde_json::from_reader(BufReader::new(file))?;
    let version = SchemaVersion::parse(&record.schema_version)
        .ok_or_else(|| ConfbookError::UnsupportedSchemaVersion(record.schema_version.clone()))?;
    if !version.is_compatible(&SchemaVersion::V1_0) {
        return Err(ConfbookError::UnsupportedSchemaVersion(record.schema_version));
    }

    Ok(Some(record.data))
}

/// Paths of the `*.json` files of a directory, in file-name order
///
/// Dot files (including in-flight temp files) are left out. Contents are not
/// inspected.
pub(crate) fn json_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        ConfbookError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read directory {:?}: {}", dir, e),
        ))
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Failed to read directory entry: {}", e);
                continue;
            }
        };
        let path = entry.path();

        if !path.extension().map(|e| e == "json").unwrap_or(false) {
            continue;
        }
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
        {
            continue;
        }
        paths.push(path);
    }
    paths.sort();
    Ok(paths)
}

/// Every readable record in a directory, in file-name order
///
/// Temp files, non-JSON files and unreadable records are skipped.
pub(crate) fn read_all<T: DeserializeOwned>(dir: &Path) -> Result<Vec<(PathBuf, T)>> {
    let paths = json_paths(dir)?;
    let mut records = Vec::with_capacity(paths.len());
    for path in paths {
        match read_record::<T>(&path) {
            Ok(Some(data)) => records.push((path, data)),
            Ok(None) => {}
            Err(e) => warn!("Failed to read record {:?}: {}", path, e),
        }
    }
    Ok(records)
}

/// Delete a file, reporting whether it existed
pub(crate) fn remove_file(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed {:?}", path);
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ConfbookError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read() {
        let temp = TempDir::new().unwrap();
        let path = write_record(temp.path(), "answer", &42u32).unwrap();

        assert!(!temp.path().join(".answer.json.tmp").exists());
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("schema_version"));

        assert_eq!(read_record::<u32>(&path).unwrap(), Some(42));
        assert_eq!(read_record::<u32>(&temp.path().join("missing.json")).unwrap(), None);
    }

    #[test]
    fn test_incompatible_version_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("old.json");
        fs::write(&path, r#"{"schema_version":"2.0","data":1}"#).unwrap();

        assert!(matches!(
            read_record::<u32>(&path),
            Err(ConfbookError::UnsupportedSchemaVersion(_))
        ));
    }

    #[test]
    fn test_read_all_skips_noise() {
        let temp = TempDir::new().unwrap();
        write_record(temp.path(), "b", &2u32).unwrap();
        write_record(temp.path(), "a", &1u32).unwrap();
        fs::write(temp.path().join(".c.json.tmp"), "{}").unwrap();
        fs::write(temp.path().join(".hidden.json"), "{}").unwrap();
        fs::write(temp.path().join("readme.txt"), "test").unwrap();
        fs::write(temp.path().join("broken.json"), "{").unwrap();

        let values: Vec<u32> = read_all::<u32>(temp.path())
            .unwrap()
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(values, vec![1, 2]);

        let names: Vec<_> = json_paths(temp.path())
            .unwrap()
            .into_iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names, vec!["a.json", "b.json", "broken.json"]);
    }
}
