//! Show command implementation

use anyhow::Result;
use std::io::Write;

use super::QueryOptions;
use crate::export::{render, ExportFormat};
use crate::query::{apply_limit, sort_chronological, SortOrder};

#[derive(Debug, Clone)]
pub struct ShowOptions {
    pub query: QueryOptions,
    /// Most recent N records, 0 = all
    pub limit: usize,
    pub order: SortOrder,
    pub json: bool,
    /// Per-line truncation, 0 = none
    pub max_chars: usize,
}

pub fn run(options: &ShowOptions, out: &mut impl Write) -> Result<()> {
    let mut records = options.query.load()?;
    sort_chronological(&mut records, options.order);
    apply_limit(&mut records, options.limit, options.order);

    if options.json {
        out.write_all(&render(ExportFormat::Jsonl, &records)?)?;
        return Ok(());
    }

    if records.is_empty() {
        writeln!(out, "No records found. Run 'codex-history sync' first.")?;
        return Ok(());
    }

    for record in &records {
        writeln!(
            out,
            "{} [{}] {}: {}",
            record.timestamp,
            short_session_id(&record.session_id),
            record.role,
            one_line(&record.text, options.max_chars)
        )?;
    }
    Ok(())
}

fn short_session_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Flatten to one line (newlines shown as `\n`) and cut at `max_chars`.
fn one_line(text: &str, max_chars: usize) -> String {
    let value = text.trim().replace('\n', "\\n");
    if max_chars == 0 || value.chars().count() <= max_chars {
        return value;
    }
    let cut: String = value.chars().take(max_chars).collect();
    format!("{}...", cut)
}
