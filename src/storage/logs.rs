//! Append-only JSONL logs and the run summary file

use super::StorageError;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Newline-delimited JSON log, one serialized record per line
///
/// The file is opened in append mode so an interrupted run leaves every
/// completed record intact.
#[derive(Debug)]
pub struct JsonlLog {
    path: PathBuf,
    file: File,
}

impl JsonlLog {
    /// Opens (creating if absent) a JSONL log for appending
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| StorageError::OpenLog {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Appends one record as a single JSON line
    pub fn append<T: Serialize>(&mut self, record: &T) -> Result<(), StorageError> {
        let line = serde_json::to_string(record)?;
        writeln!(self.file, "{}", line).map_err(|source| StorageError::AppendLog {
            path: self.path.display().to_string(),
            source,
        })
    }
}

/// Writes a pretty-printed JSON document, replacing any previous contents
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let body = serde_json::to_string_pretty(value)?;
    fs::write(path, body).map_err(|source| StorageError::Write {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Row {
        url: String,
        n: u32,
    }

    #[test]
    fn test_append_writes_one_line_per_record() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("crawl.jsonl");
        let mut log = JsonlLog::open(&path).unwrap();
        log.append(&Row {
            url: "https://a.com/".to_string(),
            n: 1,
        })
        .unwrap();
        log.append(&Row {
            url: "https://a.com/b".to_string(),
            n: 2,
        })
        .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["url"], "https://a.com/");
        assert_eq!(first["n"], 1);
    }

    #[test]
    fn test_reopen_appends_rather_than_truncates() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("crawl.jsonl");
        {
            let mut log = JsonlLog::open(&path).unwrap();
            log.append(&Row {
                url: "one".to_string(),
                n: 1,
            })
            .unwrap();
        }
        {
            let mut log = JsonlLog::open(&path).unwrap();
            log.append(&Row {
                url: "two".to_string(),
                n: 2,
            })
            .unwrap();
        }
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_write_json_pretty_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("summary.json");
        write_json_pretty(&path, &Row {
            url: "a".to_string(),
            n: 1,
        })
        .unwrap();
        write_json_pretty(&path, &Row {
            url: "b".to_string(),
            n: 2,
        })
        .unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["url"], "b");
    }
}
