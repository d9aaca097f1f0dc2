//! Command handlers
//!
//! Each handler takes resolved options (config defaults already applied)
//! and writes its normal output to the given writer.

pub mod export;
pub mod sessions;
pub mod show;
pub mod stats;
pub mod sync;
pub mod watch;

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::query::{filter_records, RecordFilter};
use crate::record::Record;
use crate::store::HistoryStore;

/// Input log plus the filter every read command applies first.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub input: PathBuf,
    pub filter: RecordFilter,
}

impl QueryOptions {
    /// Load the history log and keep the matching records, in append order.
    pub fn load(&self) -> Result<Vec<Record>> {
        let records = HistoryStore::open(&self.input)
            .load_records()
            .context("failed to read history")?;
        Ok(filter_records(&records, &self.filter))
    }
}
