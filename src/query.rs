//! Filtering, ordering and windowing over loaded history records

use chrono::{DateTime, Utc};

use crate::error::{HistoryError, Result};
use crate::record::Record;
use crate::timestamp::{compare_timestamps, parse_time_bound, parse_timestamp};

/// Conjunction of optional predicates. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub session_id: Option<String>,
    pub role: Option<String>,
    pub contains: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl RecordFilter {
    /// Build a filter from raw user input. Blank strings mean "unset".
    ///
    /// Fails on a time bound that is not RFC 3339, or when `from` is later
    /// than `to`.
    pub fn from_args(
        session_id: Option<&str>,
        role: Option<&str>,
        contains: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Self> {
        let filter = Self {
            session_id: non_blank(session_id),
            role: non_blank(role),
            contains: non_blank(contains),
            from: parse_time_bound(from, "--from")?,
            to: parse_time_bound(to, "--to")?,
        };
        filter.validate()?;
        Ok(filter)
    }

    pub fn validate(&self) -> Result<()> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(HistoryError::config(format!(
                    "--from ({}) must not be later than --to ({})",
                    from.to_rfc3339(),
                    to.to_rfc3339()
                )));
            }
        }
        Ok(())
    }

    fn has_time_bound(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    pub fn matches(&self, record: &Record) -> bool {
        if let Some(session_id) = &self.session_id {
            if &record.session_id != session_id {
                return false;
            }
        }

        if let Some(role) = &self.role {
            if !record.role.eq_ignore_ascii_case(role) {
                return false;
            }
        }

        if let Some(needle) = &self.contains {
            if !record.text.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }

        if self.has_time_bound() {
            let Some(ts) = parse_timestamp(&record.timestamp) else {
                return false;
            };
            if self.from.is_some_and(|from| ts < from) || self.to.is_some_and(|to| ts > to) {
                return false;
            }
        }

        true
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Records matching `filter`, in their original relative order.
pub fn filter_records(records: &[Record], filter: &RecordFilter) -> Vec<Record> {
    records
        .iter()
        .filter(|record| filter.matches(record))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Stable chronological sort. Descending is the reverse of ascending, so
/// equal timestamps come out in reverse append order.
pub fn sort_chronological(records: &mut [Record], order: SortOrder) {
    records.sort_by(|a, b| compare_timestamps(&a.timestamp, &b.timestamp));
    if order == SortOrder::Descending {
        records.reverse();
    }
}

/// Keep the `limit` most recent records of an already-sorted list.
/// `limit == 0` keeps everything.
pub fn apply_limit(records: &mut Vec<Record>, limit: usize, order: SortOrder) {
    if limit == 0 || records.len() <= limit {
        return;
    }
    match order {
        SortOrder::Ascending => {
            records.drain(..records.len() - limit);
        }
        SortOrder::Descending => records.truncate(limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(session: &str, ts: &str, role: &str, text: &str) -> Record {
        Record::new(session, ts, role, text)
    }

    fn texts(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn test_filter_composition() {
        let records = vec![
            rec("s1", "2026-02-17T12:00:00Z", "user", "hello world"),
            rec("s1", "2026-02-17T12:01:00Z", "assistant", "HELLO back"),
            rec("s2", "2026-02-18T12:00:00Z", "user", "different"),
        ];

        let filter = RecordFilter::from_args(
            Some("s1"),
            None,
            Some("hello"),
            Some("2026-02-17T12:00:30Z"),
            Some("2026-02-17T12:02:00Z"),
        )
        .unwrap();

        let filtered = filter_records(&records, &filter);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].role, "assistant");
    }

    #[test]
    fn test_role_match_is_case_insensitive_and_exact() {
        let records = vec![
            rec("s1", "t1", "user", "a"),
            rec("s1", "t2", "assistant", "b"),
            rec("s1", "t3", "users", "c"),
        ];
        let filter = RecordFilter::from_args(None, Some("USER"), None, None, None).unwrap();
        assert_eq!(texts(&filter_records(&records, &filter)), vec!["a"]);
    }

    #[test]
    fn test_time_window_is_inclusive_and_excludes_unparsable() {
        let records = vec![
            rec("s1", "2026-02-17T12:00:00Z", "user", "at-from"),
            rec("s1", "2026-02-17T12:05:00Z", "user", "at-to"),
            rec("s1", "2026-02-17T12:06:00Z", "user", "after"),
            rec("s1", "whenever", "user", "undated"),
        ];

        let only_from =
            RecordFilter::from_args(None, None, None, Some("2026-02-17T12:00:00Z"), None).unwrap();
        assert_eq!(
            texts(&filter_records(&records, &only_from)),
            vec!["at-from", "at-to", "after"]
        );

        let window = RecordFilter::from_args(
            None,
            None,
            None,
            Some("2026-02-17T12:00:00Z"),
            Some("2026-02-17T12:05:00Z"),
        )
        .unwrap();
        assert_eq!(texts(&filter_records(&records, &window)), vec!["at-from", "at-to"]);

        let unbounded = RecordFilter::default();
        assert_eq!(filter_records(&records, &unbounded).len(), 4);
    }

    #[test]
    fn test_invalid_bounds_are_config_errors() {
        assert!(matches!(
            RecordFilter::from_args(None, None, None, Some("yesterday"), None),
            Err(HistoryError::Config(_))
        ));
        assert!(matches!(
            RecordFilter::from_args(
                None,
                None,
                None,
                Some("2026-02-18T00:00:00Z"),
                Some("2026-02-17T00:00:00Z")
            ),
            Err(HistoryError::Config(_))
        ));
    }

    #[test]
    fn test_sort_places_unparsable_first_and_is_stable() {
        let mut records = vec![
            rec("s1", "2026-02-17T12:00:02Z", "user", "late"),
            rec("s1", "2026-02-17T12:00:01Z", "user", "tie-a"),
            rec("s1", "garbage", "user", "undated"),
            rec("s1", "2026-02-17T12:00:01Z", "assistant", "tie-b"),
        ];

        sort_chronological(&mut records, SortOrder::Ascending);
        assert_eq!(texts(&records), vec!["undated", "tie-a", "tie-b", "late"]);

        sort_chronological(&mut records, SortOrder::Descending);
        assert_eq!(texts(&records), vec!["late", "tie-b", "tie-a", "undated"]);
    }

    #[test]
    fn test_limit_keeps_most_recent_in_both_orders() {
        let base = vec![
            rec("s1", "2026-02-17T12:00:01Z", "user", "one"),
            rec("s1", "2026-02-17T12:00:02Z", "user", "two"),
            rec("s1", "2026-02-17T12:00:03Z", "user", "three"),
        ];

        let mut asc = base.clone();
        sort_chronological(&mut asc, SortOrder::Ascending);
        apply_limit(&mut asc, 2, SortOrder::Ascending);
        assert_eq!(texts(&asc), vec!["two", "three"]);

        let mut desc = base.clone();
        sort_chronological(&mut desc, SortOrder::Descending);
        apply_limit(&mut desc, 2, SortOrder::Descending);
        assert_eq!(texts(&desc), vec!["three", "two"]);

        let mut all = base;
        apply_limit(&mut all, 0, SortOrder::Ascending);
        assert_eq!(all.len(), 3);
    }
}
