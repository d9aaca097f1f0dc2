//! Error types shared by the merge engine and the query layer

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HistoryError>;

#[derive(Debug, Error)]
pub enum HistoryError {
    /// Bad time bound, inverted window, bad interval or unreadable config.
    #[error("{0}")]
    Config(String),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed envelope JSON. Fatal for the whole sync.
    #[error("failed to parse {}: line {line}: {source}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse {}: line {line}: line exceeds {limit} bytes", path.display())]
    LineTooLong {
        path: PathBuf,
        line: usize,
        limit: usize,
    },

    #[error("unsupported export format {0:?} (expected markdown, csv or jsonl)")]
    UnsupportedFormat(String),

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
}

impl HistoryError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
