//! History log storage
//!
//! The history is a JSONL file with one [`Record`] per line, only ever
//! appended to. Reading is lenient (lines that do not decode are skipped);
//! writing is strict.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{HistoryError, Result};
use crate::lines::{BoundedLines, LineError, MAX_LINE_BYTES};
use crate::record::Record;

pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ids already present in the log. A log that does not exist yet is empty.
    pub fn load_existing_ids(&self) -> Result<HashSet<String>> {
        let mut ids = HashSet::new();

        let Some(file) = self.open_if_exists()? else {
            return Ok(ids);
        };

        self.for_each_record(file, |record| {
            if let Some(id) = record.effective_id() {
                ids.insert(id);
            }
        })?;

        Ok(ids)
    }

    /// Every decodable record, in append order.
    pub fn load_records(&self) -> Result<Vec<Record>> {
        let file = File::open(&self.path).map_err(|e| HistoryError::io(&self.path, e))?;

        let mut records = Vec::new();
        self.for_each_record(file, |record| records.push(record))?;
        Ok(records)
    }

    /// Append records in order, creating the log and its parent directories
    /// on first write. The file is synced to disk before returning.
    pub fn append_records(&self, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| HistoryError::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| HistoryError::io(&self.path, e))?;

        let mut writer = BufWriter::new(file);
        for record in records {
            serde_json::to_writer(&mut writer, record)?;
            writer
                .write_all(b"\n")
                .map_err(|e| HistoryError::io(&self.path, e))?;
        }

        let file = writer
            .into_inner()
            .map_err(|e| HistoryError::io(&self.path, e.into_error()))?;
        file.sync_all().map_err(|e| HistoryError::io(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), appended = records.len(), "appended records");
        Ok(())
    }

    fn open_if_exists(&self) -> Result<Option<File>> {
        match File::open(&self.path) {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(HistoryError::io(&self.path, e)),
        }
    }

    fn for_each_record(&self, file: File, mut visit: impl FnMut(Record)) -> Result<()> {
        let mut lines = BoundedLines::new(BufReader::new(file), MAX_LINE_BYTES);
        let mut skipped = 0usize;

        while let Some(next) = lines.next_line() {
            let line = match next {
                Ok((_, line)) => line,
                Err(LineError::TooLong { line }) => {
                    return Err(HistoryError::LineTooLong {
                        path: self.path.clone(),
                        line,
                        limit: MAX_LINE_BYTES,
                    })
                }
                Err(LineError::Io(e)) => return Err(HistoryError::io(&self.path, e)),
            };

            match serde_json::from_slice::<Record>(line) {
                Ok(record) => visit(record),
                Err(_) => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::debug!(path = %self.path.display(), skipped, "skipped undecodable history lines");
        }
        Ok(())
    }
}
