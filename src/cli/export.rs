//! Export command implementation

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use super::QueryOptions;
use crate::export::{render, ExportFormat};
use crate::query::{apply_limit, sort_chronological, SortOrder};

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub query: QueryOptions,
    pub format: ExportFormat,
    pub order: SortOrder,
    /// Most recent N records, 0 = all
    pub limit: usize,
    /// Destination file; stdout when unset
    pub output: Option<PathBuf>,
}

pub fn run(options: &ExportOptions, out: &mut impl Write) -> Result<()> {
    let mut records = options.query.load()?;
    sort_chronological(&mut records, options.order);
    apply_limit(&mut records, options.limit, options.order);

    let content = render(options.format, &records)?;

    match &options.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(path, &content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("exported {} records to {}", records.len(), path.display());
        }
        None => out.write_all(&content)?,
    }
    Ok(())
}
