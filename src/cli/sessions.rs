//! Sessions command implementation

use anyhow::Result;
use std::io::Write;

use super::QueryOptions;
use crate::stats::build_session_summaries;

pub fn run(query: &QueryOptions, limit: usize, json: bool, out: &mut impl Write) -> Result<()> {
    let records = query.load()?;
    let mut summaries = build_session_summaries(&records);
    if limit > 0 {
        summaries.truncate(limit);
    }

    if json {
        serde_json::to_writer_pretty(&mut *out, &summaries)?;
        writeln!(out)?;
        return Ok(());
    }

    if summaries.is_empty() {
        writeln!(out, "No sessions found. Run 'codex-history sync' first.")?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<36} {:>6} {:>6} {:>9} {:>6}  {:<30} {}",
        "Session", "Total", "User", "Assistant", "Other", "First", "Last"
    )?;
    writeln!(out, "{}", "-".repeat(130))?;

    for summary in summaries {
        writeln!(
            out,
            "{:<36} {:>6} {:>6} {:>9} {:>6}  {:<30} {}",
            summary.session_id,
            summary.counts.total,
            summary.counts.user,
            summary.counts.assistant,
            summary.counts.other,
            summary.first_timestamp,
            summary.last_timestamp,
        )?;
    }
    Ok(())
}
