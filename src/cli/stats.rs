//! Stats command implementation

use anyhow::Result;
use std::io::Write;

use super::QueryOptions;
use crate::stats::compute_stats;

pub fn run(query: &QueryOptions, json: bool, out: &mut impl Write) -> Result<()> {
    let records = query.load()?;
    let stats = compute_stats(&records);

    if json {
        serde_json::to_writer_pretty(&mut *out, &stats)?;
        writeln!(out)?;
        return Ok(());
    }

    let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };

    writeln!(out, "records:   {}", stats.counts.total)?;
    writeln!(out, "user:      {}", stats.counts.user)?;
    writeln!(out, "assistant: {}", stats.counts.assistant)?;
    writeln!(out, "other:     {}", stats.counts.other)?;
    writeln!(out, "sessions:  {}", stats.session_count)?;
    writeln!(out, "first:     {}", or_dash(&stats.first_timestamp))?;
    writeln!(out, "last:      {}", or_dash(&stats.last_timestamp))?;
    Ok(())
}
