//! Global and per-session aggregates

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::record::{Record, RoleCounts};
use crate::timestamp::compare_timestamps;

/// Bucket for records that carry no session id.
pub const UNKNOWN_SESSION: &str = "unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    #[serde(flatten)]
    pub counts: RoleCounts,
    pub session_count: usize,
    pub first_timestamp: String,
    pub last_timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    #[serde(flatten)]
    pub counts: RoleCounts,
    pub first_timestamp: String,
    pub last_timestamp: String,
}

/// Running earliest/latest timestamp.
#[derive(Debug, Default)]
struct Span {
    first: String,
    last: String,
}

impl Span {
    fn observe(&mut self, ts: &str) {
        if ts.is_empty() {
            return;
        }
        if self.first.is_empty() || compare_timestamps(ts, &self.first) == Ordering::Less {
            self.first = ts.to_string();
        }
        if self.last.is_empty() || compare_timestamps(ts, &self.last) == Ordering::Greater {
            self.last = ts.to_string();
        }
    }
}

fn session_key(record: &Record) -> &str {
    if record.session_id.is_empty() {
        UNKNOWN_SESSION
    } else {
        &record.session_id
    }
}

pub fn compute_stats(records: &[Record]) -> Stats {
    let mut counts = RoleCounts::default();
    let mut span = Span::default();
    let mut sessions = HashSet::new();

    for record in records {
        counts.add(record.role_bucket());
        sessions.insert(session_key(record));
        span.observe(&record.timestamp);
    }

    Stats {
        counts,
        session_count: sessions.len(),
        first_timestamp: span.first,
        last_timestamp: span.last,
    }
}

/// One summary per session, most recently active first; ties by session id.
pub fn build_session_summaries(records: &[Record]) -> Vec<SessionSummary> {
    let mut by_session: HashMap<&str, (RoleCounts, Span)> = HashMap::new();

    for record in records {
        let (counts, span) = by_session.entry(session_key(record)).or_default();
        counts.add(record.role_bucket());
        span.observe(&record.timestamp);
    }

    let mut summaries: Vec<SessionSummary> = by_session
        .into_iter()
        .map(|(session_id, (counts, span))| SessionSummary {
            session_id: session_id.to_string(),
            counts,
            first_timestamp: span.first,
            last_timestamp: span.last,
        })
        .collect();

    summaries.sort_by(|a, b| {
        compare_timestamps(&b.last_timestamp, &a.last_timestamp)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
    summaries
}
