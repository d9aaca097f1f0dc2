//! Rendering record sets as markdown, CSV or JSONL

use std::fmt::Write as _;
use std::io::Write as _;
use std::str::FromStr;

use crate::error::{HistoryError, Result};
use crate::record::Record;

const MARKDOWN_TITLE: &str = "# Codex Conversation Export";
const CSV_HEADER: [&str; 7] = [
    "id",
    "session_id",
    "timestamp",
    "role",
    "text",
    "source_file",
    "source_line",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Csv,
    Jsonl,
}

impl FromStr for ExportFormat {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "csv" => Ok(ExportFormat::Csv),
            "jsonl" => Ok(ExportFormat::Jsonl),
            _ => Err(HistoryError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Render `records` in the given order. An unknown format yields an error
/// and no bytes.
pub fn render_export(format: &str, records: &[Record]) -> Result<Vec<u8>> {
    render(format.parse()?, records)
}

pub fn render(format: ExportFormat, records: &[Record]) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Markdown => Ok(render_markdown(records).into_bytes()),
        ExportFormat::Csv => render_csv(records),
        ExportFormat::Jsonl => render_jsonl(records),
    }
}

/// Escape a value so it stays inside one markdown table cell.
fn markdown_cell(value: &str) -> String {
    value
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace(['\n', '\r'], "<br>")
}

fn render_markdown(records: &[Record]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", MARKDOWN_TITLE);
    let _ = writeln!(out);
    let _ = writeln!(out, "Records: {}", records.len());
    let _ = writeln!(out);
    let _ = writeln!(out, "| id | session | timestamp | role | text |");
    let _ = writeln!(out, "| --- | --- | --- | --- | --- |");

    for record in records {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            markdown_cell(&record.id),
            markdown_cell(&record.session_id),
            markdown_cell(&record.timestamp),
            markdown_cell(&record.role),
            markdown_cell(&record.text),
        );
    }
    out
}

fn render_csv(records: &[Record]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(CSV_HEADER)?;

    for record in records {
        let line = record.source_line.map(|n| n.to_string()).unwrap_or_default();
        wtr.write_record([
            record.id.as_str(),
            record.session_id.as_str(),
            record.timestamp.as_str(),
            record.role.as_str(),
            record.text.as_str(),
            record.source_file.as_deref().unwrap_or(""),
            line.as_str(),
        ])?;
    }

    wtr.into_inner()
        .map_err(|e| HistoryError::Csv(csv::Error::from(e.into_error())))
}

fn render_jsonl(records: &[Record]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        // Writing into a Vec cannot fail.
        let _ = out.write_all(b"\n");
    }
    Ok(out)
}
