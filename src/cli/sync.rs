//! Sync command implementation

use anyhow::Result;
use std::io::Write;

use crate::sync::{sync_once, SyncOptions};

pub fn run(options: &SyncOptions, out: &mut impl Write) -> Result<()> {
    let report = sync_once(options)?;

    write!(
        out,
        "files={} scanned={} new={} output={}",
        report.files_seen,
        report.records_scanned,
        report.records_written,
        options.output_path.display()
    )?;
    if options.dry_run {
        write!(out, " (dry run)")?;
    }
    writeln!(out)?;
    Ok(())
}
