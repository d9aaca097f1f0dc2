pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod lines;
pub mod logging;
pub mod probe;
pub mod query;
pub mod record;
pub mod stats;
pub mod store;
pub mod sync;
pub mod timestamp;

pub use config::Config;
pub use error::{HistoryError, Result};
pub use record::Record;
pub use store::HistoryStore;
pub use sync::{sync_once, SyncOptions, SyncReport};
