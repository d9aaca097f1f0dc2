use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use codex_history::cli::export::ExportOptions;
use codex_history::cli::show::ShowOptions;
use codex_history::cli::{export, sessions, show, stats, sync, watch, QueryOptions};
use codex_history::config::{self, Config};
use codex_history::query::{RecordFilter, SortOrder};
use codex_history::timestamp::parse_time_bound;
use codex_history::{logging, SyncOptions};

#[derive(Parser)]
#[command(name = "codex-history", version)]
#[command(about = "Record Codex conversations from ~/.codex/sessions into one deduplicated history")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = "codex-history.yaml")]
    config: String,

    /// Verbose diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge new session events into the history once
    Sync {
        #[command(flatten)]
        source: SourceArgs,

        /// Scan and count without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Keep merging on an interval until interrupted
    Watch {
        #[command(flatten)]
        source: SourceArgs,

        /// Time between passes (e.g. 5s, 500ms, 2m)
        #[arg(long)]
        interval: Option<String>,
    },

    /// Print history records
    Show {
        #[command(flatten)]
        query: QueryArgs,

        /// Maximum records to print, 0 means all
        #[arg(long)]
        limit: Option<usize>,

        /// Print as JSONL
        #[arg(long)]
        json: bool,

        /// Newest first
        #[arg(long)]
        desc: bool,

        /// Max chars per message line, 0 means no truncation
        #[arg(long)]
        max_chars: Option<usize>,
    },

    /// Show totals over the history
    Stats {
        #[command(flatten)]
        query: QueryArgs,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List sessions, most recently active first
    Sessions {
        #[command(flatten)]
        query: QueryArgs,

        /// Maximum sessions to list, 0 means all
        #[arg(long, default_value_t = 0)]
        limit: usize,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export history as markdown, csv or jsonl
    Export {
        #[command(flatten)]
        query: QueryArgs,

        /// Output format: markdown, csv or jsonl
        #[arg(short, long, default_value = "markdown")]
        format: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Newest first
        #[arg(long)]
        desc: bool,

        /// Most recent N records, 0 means all
        #[arg(long, default_value_t = 0)]
        limit: usize,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Codex sessions directory
    #[arg(long)]
    sessions_dir: Option<String>,

    /// History JSONL path
    #[arg(long)]
    out: Option<String>,

    /// Only include records at/after this RFC3339 timestamp
    #[arg(long)]
    from: Option<String>,
}

#[derive(Args)]
struct QueryArgs {
    /// History JSONL path
    #[arg(long = "in")]
    input: Option<String>,

    /// Filter by session ID
    #[arg(long)]
    session: Option<String>,

    /// Filter by role (user, assistant, ...)
    #[arg(long)]
    role: Option<String>,

    /// Case-insensitive text match
    #[arg(long)]
    contains: Option<String>,

    /// Only records at/after this RFC3339 timestamp
    #[arg(long)]
    from: Option<String>,

    /// Only records at/before this RFC3339 timestamp
    #[arg(long)]
    to: Option<String>,
}

impl SourceArgs {
    fn resolve(&self, config: &Config, dry_run: bool) -> Result<SyncOptions> {
        Ok(SyncOptions {
            sessions_dir: self
                .sessions_dir
                .as_deref()
                .map(config::expand)
                .unwrap_or_else(|| config.sessions_dir()),
            output_path: self
                .out
                .as_deref()
                .map(config::expand)
                .unwrap_or_else(|| config.history_path()),
            since: parse_time_bound(self.from.as_deref(), "--from")?,
            dry_run,
        })
    }
}

impl QueryArgs {
    fn resolve(&self, config: &Config) -> Result<QueryOptions> {
        let filter = RecordFilter::from_args(
            self.session.as_deref(),
            self.role.as_deref(),
            self.contains.as_deref(),
            self.from.as_deref(),
            self.to.as_deref(),
        )?;
        Ok(QueryOptions {
            input: self
                .input
                .as_deref()
                .map(config::expand)
                .unwrap_or_else(|| config.history_path()),
            filter,
        })
    }
}

fn order(desc: bool) -> SortOrder {
    if desc {
        SortOrder::Descending
    } else {
        SortOrder::Ascending
    }
}

fn main() -> ExitCode {
    // Usage errors exit with status 2 from inside clap.
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(&cli.config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Sync { source, dry_run } => {
            let options = source.resolve(&config, dry_run)?;
            sync::run(&options, &mut out)?;
        }
        Commands::Watch { source, interval } => {
            let interval = match interval {
                Some(value) => config::parse_interval(&value)?,
                None => config.watch_interval()?,
            };
            let options = source.resolve(&config, false)?;
            watch::run(&options, interval, &mut out)?;
        }
        Commands::Show {
            query,
            limit,
            json,
            desc,
            max_chars,
        } => {
            let options = ShowOptions {
                query: query.resolve(&config)?,
                limit: limit.unwrap_or(config.show.limit),
                order: order(desc),
                json,
                max_chars: max_chars.unwrap_or(config.show.max_chars),
            };
            show::run(&options, &mut out)?;
        }
        Commands::Stats { query, json } => {
            stats::run(&query.resolve(&config)?, json, &mut out)?;
        }
        Commands::Sessions { query, limit, json } => {
            sessions::run(&query.resolve(&config)?, limit, json, &mut out)?;
        }
        Commands::Export {
            query,
            format,
            output,
            desc,
            limit,
        } => {
            // Reject the format before touching the history.
            let format = format.parse()?;
            let options = ExportOptions {
                query: query.resolve(&config)?,
                format,
                order: order(desc),
                limit,
                output,
            };
            export::run(&options, &mut out)?;
        }
    }

    Ok(())
}
