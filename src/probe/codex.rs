//! Codex rollout file extraction
//!
//! Every line of a rollout file is an envelope:
//! `{"timestamp": "...", "type": "...", "payload": {...}}`.
//! Only two envelope types matter here:
//! - `session_meta` carries the session id (`payload.id`)
//! - `event_msg` carries a conversational turn (`payload.type`, `payload.message`)
//!
//! The envelope is a structural contract, so a malformed line fails the whole
//! file. Payloads evolve with the runtime, so a payload that does not decode
//! only skips its line.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{HistoryError, Result};
use crate::lines::{BoundedLines, LineError, MAX_LINE_BYTES};
use crate::record::{Record, ROLE_ASSISTANT, ROLE_USER};
use crate::timestamp::{normalize_timestamp, parse_timestamp};

static SESSION_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap()
});

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, Deserialize)]
struct SessionMetaPayload {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventMsgPayload {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Session id implied by a rollout file name: the last UUID in the name,
/// else the file stem.
pub fn session_id_from_path(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if let Some(found) = SESSION_ID_PATTERN.find_iter(&name).last() {
        return found.as_str().to_string();
    }

    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or(name)
}

/// Every line must hold one JSON object, blank lines included. Bytes that are
/// not UTF-8 become U+FFFD instead of failing the line.
fn decode_envelope(line: &[u8]) -> serde_json::Result<Envelope> {
    let text = String::from_utf8_lossy(line);
    let object: Map<String, Value> = serde_json::from_str(&text)?;
    serde_json::from_value(Value::Object(object))
}

fn role_for_event(kind: &str) -> Option<&'static str> {
    match kind {
        "user_message" => Some(ROLE_USER),
        "agent_message" => Some(ROLE_ASSISTANT),
        _ => None,
    }
}

/// Extract user/assistant records from one rollout file, in file order.
///
/// With `since` set, records whose timestamp parses and falls strictly
/// before it are dropped. Records with unparsable timestamps are kept.
pub fn extract_records(path: &Path, since: Option<DateTime<Utc>>) -> Result<Vec<Record>> {
    extract_with_limit(path, since, MAX_LINE_BYTES)
}

pub(crate) fn extract_with_limit(
    path: &Path,
    since: Option<DateTime<Utc>>,
    max_line_bytes: usize,
) -> Result<Vec<Record>> {
    let file = File::open(path).map_err(|e| HistoryError::io(path, e))?;
    let mut lines = BoundedLines::new(BufReader::new(file), max_line_bytes);

    let source_file = path.to_string_lossy().into_owned();
    let mut session_id = session_id_from_path(path);
    let mut records = vec![];
    let mut skipped = 0usize;

    while let Some(next) = lines.next_line() {
        let (line_number, line) = match next {
            Ok(line) => line,
            Err(LineError::TooLong { line }) => {
                return Err(HistoryError::LineTooLong {
                    path: path.to_path_buf(),
                    line,
                    limit: max_line_bytes,
                })
            }
            Err(LineError::Io(e)) => return Err(HistoryError::io(path, e)),
        };

        let envelope = decode_envelope(line).map_err(|source| HistoryError::Parse {
            path: path.to_path_buf(),
            line: line_number,
            source,
        })?;

        match envelope.kind.as_deref() {
            Some("session_meta") => {
                if let Ok(meta) = serde_json::from_value::<SessionMetaPayload>(envelope.payload) {
                    let id = meta.id.as_deref().map(str::trim).unwrap_or_default();
                    if !id.is_empty() {
                        session_id = id.to_string();
                    }
                }
            }
            Some("event_msg") => {
                let Ok(event) = serde_json::from_value::<EventMsgPayload>(envelope.payload) else {
                    skipped += 1;
                    continue;
                };

                let role = event.kind.as_deref().and_then(role_for_event);
                let text = event.message.as_deref().map(str::trim).unwrap_or_default();
                let Some(role) = role.filter(|_| !text.is_empty()) else {
                    continue;
                };

                let timestamp = normalize_timestamp(envelope.timestamp.as_deref().unwrap_or_default());
                if let (Some(since), Some(ts)) = (since, parse_timestamp(&timestamp)) {
                    if ts < since {
                        continue;
                    }
                }

                records.push(
                    Record::new(&session_id, &timestamp, role, text)
                        .with_source(source_file.as_str(), line_number as u64),
                );
            }
            _ => {}
        }
    }

    tracing::debug!(
        path = %path.display(),
        records = records.len(),
        undecodable_payloads = skipped,
        "extracted session file"
    );
    Ok(records)
}
