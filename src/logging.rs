use tracing_subscriber::{fmt, EnvFilter};

/// Install the diagnostic subscriber.
///
/// Diagnostics go to stderr so command output on stdout stays clean for
/// piping. `RUST_LOG` wins when set; otherwise `warn`, or `debug` with
/// `verbose`.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
