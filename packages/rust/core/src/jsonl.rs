//! JSON-lines reading and writing for pipeline stage handoff.

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use arxivdigest_shared::{ArxivDigestError, Result};

/// Read a JSONL file into a vector, one record per non-empty line.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = std::fs::File::open(path).map_err(|e| ArxivDigestError::io(path, e))?;
    let reader = BufReader::new(file);

    let mut items = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| ArxivDigestError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(&line).map_err(|e| {
            ArxivDigestError::validation(format!(
                "{}:{}: invalid JSON record: {e}",
                path.display(),
                lineno + 1
            ))
        })?;
        items.push(item);
    }

    Ok(items)
}

/// Write records to a JSONL file, replacing any existing content.
pub fn write_jsonl<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|e| ArxivDigestError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    for item in items {
        let line = serde_json::to_string(item)
            .map_err(|e| ArxivDigestError::validation(format!("serialize record: {e}")))?;
        writeln!(writer, "{line}").map_err(|e| ArxivDigestError::io(path, e))?;
    }

    writer.flush().map_err(|e| ArxivDigestError::io(path, e))
}

/// Incremental JSONL writer that flushes after every record, so results
/// already written survive an interrupted run.
pub struct JsonlWriter {
    writer: BufWriter<std::fs::File>,
    path: PathBuf,
}

impl JsonlWriter {
    /// Create (or truncate) the file for writing.
    pub fn create(path: &Path) -> Result<Self> {
        let file = std::fs::File::create(path).map_err(|e| ArxivDigestError::io(path, e))?;
        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
        })
    }

    /// Append one record as a line and flush it to disk.
    pub fn append<T: Serialize>(&mut self, item: &T) -> Result<()> {
        let line = serde_json::to_string(item)
            .map_err(|e| ArxivDigestError::validation(format!("serialize record: {e}")))?;
        writeln!(self.writer, "{line}").map_err(|e| ArxivDigestError::io(&self.path, e))?;
        self.writer
            .flush()
            .map_err(|e| ArxivDigestError::io(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arxivdigest_shared::PaperRecord;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("arxivdigest-{name}-{nanos}.jsonl"))
    }

    #[test]
    fn jsonl_roundtrip() {
        let path = temp_path("roundtrip");
        let records = vec![
            PaperRecord {
                id: "2301.00001".into(),
            },
            PaperRecord {
                id: "2301.00002".into(),
            },
        ];

        write_jsonl(&path, &records).unwrap();
        let read: Vec<PaperRecord> = read_jsonl(&path).unwrap();
        assert_eq!(read, records);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn blank_lines_skipped() {
        let path = temp_path("blanks");
        std::fs::write(&path, "{\"id\":\"a\"}\n\n{\"id\":\"b\"}\n").unwrap();

        let read: Vec<PaperRecord> = read_jsonl(&path).unwrap();
        assert_eq!(read.len(), 2);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn appended_records_on_disk_before_writer_drops() {
        let path = temp_path("append");
        let mut writer = JsonlWriter::create(&path).unwrap();

        writer
            .append(&PaperRecord {
                id: "2301.00001".into(),
            })
            .unwrap();

        // Readable while the writer is still open: each append is flushed.
        let read: Vec<PaperRecord> = read_jsonl(&path).unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].id, "2301.00001");

        drop(writer);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn invalid_line_reports_line_number() {
        let path = temp_path("invalid");
        std::fs::write(&path, "{\"id\":\"a\"}\nnot json\n").unwrap();

        let err = read_jsonl::<PaperRecord>(&path).unwrap_err();
        assert!(err.to_string().contains(":2:"));

        let _ = std::fs::remove_file(&path);
    }
}
