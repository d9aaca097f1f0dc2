//! Incremental merge of session files into the history log
//!
//! A sync is all-or-nothing: every session file is extracted before the log
//! is touched, and any extraction failure abandons the whole batch.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::error::{HistoryError, Result};
use crate::probe::{discover_session_files, extract_records};
use crate::store::HistoryStore;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub sessions_dir: PathBuf,
    pub output_path: PathBuf,
    pub since: Option<DateTime<Utc>>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub files_seen: usize,
    pub records_scanned: usize,
    /// New records (would be) appended. Counted even on a dry run.
    pub records_written: usize,
}

/// Run one merge pass.
pub fn sync_once(options: &SyncOptions) -> Result<SyncReport> {
    let files = discover_session_files(&options.sessions_dir)?;

    let store = HistoryStore::open(&options.output_path);
    let mut seen = store.load_existing_ids()?;

    let mut report = SyncReport {
        files_seen: files.len(),
        ..SyncReport::default()
    };
    let mut pending = Vec::with_capacity(128);

    for path in &files {
        let records = extract_records(path, options.since)?;
        report.records_scanned += records.len();

        for record in records {
            if seen.insert(record.id.clone()) {
                pending.push(record);
            }
        }
    }

    report.records_written = pending.len();

    if options.dry_run || pending.is_empty() {
        tracing::info!(
            files = report.files_seen,
            scanned = report.records_scanned,
            new = report.records_written,
            dry_run = options.dry_run,
            "sync finished without writing"
        );
        return Ok(report);
    }

    store.append_records(&pending)?;
    tracing::info!(
        files = report.files_seen,
        scanned = report.records_scanned,
        new = report.records_written,
        output = %options.output_path.display(),
        "sync appended records"
    );
    Ok(report)
}

/// Repeat [`sync_once`] every `interval` until `shutdown` resolves.
///
/// `on_pass` sees every completed pass. Shutdown is only observed while
/// waiting for the next tick; a pass in progress always runs to completion.
/// Returns the number of passes made.
pub async fn watch<F, R>(
    options: &SyncOptions,
    interval: Duration,
    shutdown: F,
    mut on_pass: R,
) -> Result<usize>
where
    F: Future<Output = ()>,
    R: FnMut(&SyncReport),
{
    if interval.is_zero() {
        return Err(HistoryError::config("interval must be > 0"));
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the first pass runs right away.
    ticker.tick().await;

    tokio::pin!(shutdown);
    let mut passes = 0;

    loop {
        let report = sync_once(options)?;
        passes += 1;
        on_pass(&report);

        tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::debug!(passes, "watch cancelled");
                return Ok(passes);
            }
            _ = ticker.tick() => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const SESSION: &str = "11111111-2222-3333-4444-555555555555";

    fn write_lines(path: &Path, lines: &[&str]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, lines.join("\n") + "\n").unwrap();
    }

    fn options(root: &Path) -> SyncOptions {
        SyncOptions {
            sessions_dir: root.join("sessions"),
            output_path: root.join("out").join("conversation_history.jsonl"),
            since: None,
            dry_run: false,
        }
    }

    fn write_basic_session(root: &Path) {
        write_lines(
            &root.join(format!(
                "sessions/2026/02/17/rollout-2026-02-17T12-00-00-{}.jsonl",
                SESSION
            )),
            &[
                r#"{"timestamp":"2026-02-17T12:00:00Z","type":"session_meta","payload":{"id":"11111111-2222-3333-4444-555555555555"}}"#,
                r#"{"timestamp":"2026-02-17T12:00:01Z","type":"event_msg","payload":{"type":"user_message","message":"hello"}}"#,
                r#"{"timestamp":"2026-02-17T12:00:02Z","type":"event_msg","payload":{"type":"agent_message","message":"hi"}}"#,
                r#"{"timestamp":"2026-02-17T12:00:03Z","type":"event_msg","payload":{"type":"token_count","info":{}}}"#,
            ],
        );
    }

    #[test]
    fn test_sync_writes_then_dedups() {
        let dir = TempDir::new().unwrap();
        write_basic_session(dir.path());
        let opts = options(dir.path());

        let first = sync_once(&opts).unwrap();
        assert_eq!(
            first,
            SyncReport {
                files_seen: 1,
                records_scanned: 2,
                records_written: 2
            }
        );
        let after_first = fs::read(&opts.output_path).unwrap();

        let second = sync_once(&opts).unwrap();
        assert_eq!(second.records_scanned, 2);
        assert_eq!(second.records_written, 0);
        assert_eq!(fs::read(&opts.output_path).unwrap(), after_first);
    }

    #[test]
    fn test_sync_with_since_filter() {
        let dir = TempDir::new().unwrap();
        write_lines(
            &dir.path().join("sessions/rollout-aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee.jsonl"),
            &[
                r#"{"timestamp":"2026-02-17T12:00:01Z","type":"event_msg","payload":{"type":"user_message","message":"old"}}"#,
                r#"{"timestamp":"2026-02-17T12:00:10Z","type":"event_msg","payload":{"type":"agent_message","message":"new"}}"#,
            ],
        );

        let mut opts = options(dir.path());
        opts.since = crate::timestamp::parse_timestamp("2026-02-17T12:00:05Z");

        let report = sync_once(&opts).unwrap();
        assert_eq!(report.records_written, 1);

        let records = HistoryStore::open(&opts.output_path).load_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "new");
        assert_eq!(records[0].session_id, "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee");
    }

    #[test]
    fn test_dry_run_and_empty_batches_leave_log_untouched() {
        let dir = TempDir::new().unwrap();
        let mut opts = options(dir.path());

        assert_eq!(sync_once(&opts).unwrap(), SyncReport::default());
        assert!(!opts.output_path.exists());

        write_basic_session(dir.path());
        opts.dry_run = true;
        let report = sync_once(&opts).unwrap();
        assert_eq!(report.records_written, 2);
        assert!(!opts.output_path.exists());
    }

    #[test]
    fn test_same_event_in_two_files_is_written_once() {
        let dir = TempDir::new().unwrap();
        let line = r#"{"timestamp":"2026-02-17T12:00:01Z","type":"event_msg","payload":{"type":"user_message","message":"dup"}}"#;
        let meta = r#"{"timestamp":"2026-02-17T12:00:00Z","type":"session_meta","payload":{"id":"shared"}}"#;
        write_lines(&dir.path().join("sessions/a/one.jsonl"), &[meta, line]);
        write_lines(&dir.path().join("sessions/b/copy.jsonl"), &[meta, line]);

        let report = sync_once(&options(dir.path())).unwrap();
        assert_eq!(report.files_seen, 2);
        assert_eq!(report.records_scanned, 2);
        assert_eq!(report.records_written, 1);
    }

    #[test]
    fn test_parse_failure_in_later_file_writes_nothing() {
        let dir = TempDir::new().unwrap();
        write_basic_session(dir.path());
        let broken = dir.path().join("sessions/2026/02/18/rollout-broken.jsonl");
        write_lines(
            &broken,
            &[
                r#"{"timestamp":"2026-02-18T09:00:00Z","type":"event_msg","payload":{"type":"user_message","message":"fine"}}"#,
                "{not json",
            ],
        );
        let opts = options(dir.path());

        let err = sync_once(&opts).unwrap_err();
        assert!(matches!(err, HistoryError::Parse { line: 2, .. }));
        assert!(!opts.output_path.exists());

        // Fixing the file makes the next run pick everything up exactly once.
        write_lines(
            &broken,
            &[r#"{"timestamp":"2026-02-18T09:00:00Z","type":"event_msg","payload":{"type":"user_message","message":"fine"}}"#],
        );
        assert_eq!(sync_once(&opts).unwrap().records_written, 3);
        assert_eq!(sync_once(&opts).unwrap().records_written, 0);
    }

    #[test]
    fn test_new_events_are_appended_after_existing_ones() {
        let dir = TempDir::new().unwrap();
        write_basic_session(dir.path());
        let opts = options(dir.path());
        sync_once(&opts).unwrap();

        write_lines(
            &dir.path().join("sessions/2026/02/16/rollout-earlier.jsonl"),
            &[r#"{"timestamp":"2026-02-16T08:00:00Z","type":"event_msg","payload":{"type":"user_message","message":"late arrival"}}"#],
        );
        assert_eq!(sync_once(&opts).unwrap().records_written, 1);

        let records = HistoryStore::open(&opts.output_path).load_records().unwrap();
        let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "hi", "late arrival"]);
    }

    #[tokio::test]
    async fn test_watch_stops_after_first_pass_when_already_cancelled() {
        let dir = TempDir::new().unwrap();
        write_basic_session(dir.path());
        let opts = options(dir.path());

        let mut written = vec![];
        let passes = watch(&opts, Duration::from_secs(60), async {}, |report| {
            written.push(report.records_written)
        })
        .await
        .unwrap();

        assert_eq!(passes, 1);
        assert_eq!(written, vec![2]);
    }

    #[tokio::test]
    async fn test_watch_repeats_until_cancelled() {
        let dir = TempDir::new().unwrap();
        write_basic_session(dir.path());
        let opts = options(dir.path());

        let mut written = vec![];
        let passes = watch(
            &opts,
            Duration::from_millis(10),
            tokio::time::sleep(Duration::from_millis(60)),
            |report| written.push(report.records_written),
        )
        .await
        .unwrap();

        assert!(passes >= 2, "expected several passes, got {passes}");
        assert_eq!(written[0], 2);
        assert!(written[1..].iter().all(|&n| n == 0));
    }

    #[tokio::test]
    async fn test_watch_rejects_zero_interval() {
        let dir = TempDir::new().unwrap();
        let err = watch(&options(dir.path()), Duration::ZERO, async {}, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, HistoryError::Config(_)));
    }
}
