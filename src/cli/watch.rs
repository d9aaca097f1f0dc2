//! Watch command implementation

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use std::future::Future;
use std::io::Write;
use std::time::Duration;
use tracing::warn;

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

use crate::sync::{watch, SyncOptions};

pub fn run(options: &SyncOptions, interval: Duration, out: &mut impl Write) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    writeln!(
        out,
        "watching {} -> {} (interval={:?})",
        options.sessions_dir.display(),
        options.output_path.display(),
        interval
    )?;
    out.flush()?;

    runtime.block_on(watch_until_signal(options, interval, out))?;

    writeln!(out, "watch stopped")?;
    Ok(())
}

async fn watch_until_signal(
    options: &SyncOptions,
    interval: Duration,
    out: &mut impl Write,
) -> Result<()> {
    // Registered before the first pass; a signal that lands mid-pass is
    // seen at the next wait.
    let shutdown = shutdown_signal();

    let mut write_error = None;
    watch(options, interval, shutdown, |report| {
        if report.records_written == 0 || write_error.is_some() {
            return;
        }
        let line = writeln!(
            out,
            "{} files={} scanned={} new={}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            report.files_seen,
            report.records_scanned,
            report.records_written
        )
        .and_then(|_| out.flush());
        if let Err(e) = line {
            write_error = Some(e);
        }
    })
    .await?;

    match write_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Resolves on SIGINT (Ctrl-C) or SIGTERM. Handlers are installed when this
/// is called, not when the future is first polled.
#[cfg(unix)]
fn shutdown_signal() -> impl Future<Output = ()> {
    let interrupt = listen(SignalKind::interrupt(), "SIGINT");
    let terminate = listen(SignalKind::terminate(), "SIGTERM");
    async move {
        tokio::select! {
            _ = received(interrupt) => {}
            _ = received(terminate) => {}
        }
    }
}

#[cfg(not(unix))]
fn shutdown_signal() -> impl Future<Output = ()> {
    async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(unix)]
fn listen(kind: SignalKind, name: &str) -> Option<Signal> {
    match signal(kind) {
        Ok(signal) => Some(signal),
        Err(e) => {
            warn!(error = %e, "failed to install {} handler", name);
            None
        }
    }
}

#[cfg(unix)]
async fn received(handler: Option<Signal>) {
    match handler {
        Some(mut handler) => {
            handler.recv().await;
        }
        None => std::future::pending::<()>().await,
    }
}
