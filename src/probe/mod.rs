//! Session log discovery and extraction
//!
//! Codex writes one rollout file per session under `~/.codex/sessions`,
//! nested by date: `YYYY/MM/DD/rollout-<ts>-<uuid>.jsonl`.

pub mod codex;

pub use codex::{extract_records, session_id_from_path};

use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{HistoryError, Result};

/// File name suffix of a session transcript.
pub const TRANSCRIPT_SUFFIX: &str = ".jsonl";

/// Recursively list transcript files under `root`, in byte-wise path order.
///
/// A missing root is the normal state before any session has been written,
/// so it yields an empty list. Entries that vanish during the walk are
/// skipped.
pub fn discover_session_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = vec![];

    if !root.exists() {
        tracing::debug!(root = %root.display(), "sessions directory does not exist yet");
        return Ok(files);
    }

    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                let source = io::Error::from(e);
                if source.kind() == io::ErrorKind::NotFound {
                    continue;
                }
                return Err(HistoryError::io(path, source));
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }
        if entry
            .file_name()
            .to_string_lossy()
            .ends_with(TRANSCRIPT_SUFFIX)
        {
            files.push(entry.into_path());
        }
    }

    files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    Ok(files)
}
