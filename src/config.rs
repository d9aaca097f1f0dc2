//! Configuration management with YAML support

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{HistoryError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub show: ShowConfig,
}

/// Where session logs are read from and the history is written to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_sessions_dir")]
    pub sessions_dir: String,

    #[serde(default = "default_history_file")]
    pub history_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Duration between sync passes, e.g. `5s`, `500ms`, `2m`
    #[serde(default = "default_interval")]
    pub interval: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowConfig {
    #[serde(default = "default_show_limit")]
    pub limit: usize,

    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

// Default value functions
fn codex_home() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".codex"),
        None => PathBuf::from(".codex"),
    }
}

fn default_sessions_dir() -> String {
    codex_home().join("sessions").to_string_lossy().into_owned()
}

fn default_history_file() -> String {
    codex_home()
        .join("conversation_history.jsonl")
        .to_string_lossy()
        .into_owned()
}

fn default_interval() -> String {
    "5s".to_string()
}

fn default_show_limit() -> usize {
    20
}

fn default_max_chars() -> usize {
    140
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sessions_dir: default_sessions_dir(),
            history_file: default_history_file(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
        }
    }
}

impl Default for ShowConfig {
    fn default() -> Self {
        Self {
            limit: default_show_limit(),
            max_chars: default_max_chars(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    /// Searches in order:
    /// 1. Provided path
    /// 2. ./codex-history.yaml (current directory)
    /// 3. ~/.config/codex-history/codex-history.yaml
    ///
    /// No file found means defaults. A file that exists but cannot be read
    /// or parsed is an error.
    pub fn load(path: &str) -> Result<Self> {
        let search_paths = vec![
            shellexpand::tilde(path).to_string(),
            "codex-history.yaml".to_string(),
            shellexpand::tilde("~/.config/codex-history/codex-history.yaml").to_string(),
        ];

        for search_path in &search_paths {
            let candidate = Path::new(search_path);
            if candidate.exists() {
                let content = std::fs::read_to_string(candidate)
                    .map_err(|e| HistoryError::io(candidate, e))?;
                let config: Config = serde_yaml::from_str(&content).map_err(|e| {
                    HistoryError::config(format!("invalid config {}: {}", search_path, e))
                })?;
                tracing::debug!(path = %search_path, "loaded config");
                return Ok(config);
            }
        }

        // No config file found, use defaults
        Ok(Config::default())
    }

    /// Sessions directory, expanding ~ to home directory
    pub fn sessions_dir(&self) -> PathBuf {
        expand(&self.paths.sessions_dir)
    }

    /// History log path, expanding ~ to home directory
    pub fn history_path(&self) -> PathBuf {
        expand(&self.paths.history_file)
    }

    pub fn watch_interval(&self) -> Result<Duration> {
        parse_interval(&self.watch.interval)
    }
}

/// Expand a leading `~` in a user-supplied path
pub fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

/// Parse a duration such as `500ms`, `5s`, `2m`, `1h`, or bare seconds.
/// Zero is rejected.
pub fn parse_interval(value: &str) -> Result<Duration> {
    let value = value.trim();
    let invalid = || {
        HistoryError::config(format!(
            "invalid interval {:?}: expected e.g. 5s, 500ms, 2m",
            value
        ))
    };

    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let amount: u64 = digits.parse().map_err(|_| invalid())?;

    let duration = match unit.trim() {
        "ms" => Duration::from_millis(amount),
        "" | "s" => Duration::from_secs(amount),
        "m" => Duration::from_secs(amount.saturating_mul(60)),
        "h" => Duration::from_secs(amount.saturating_mul(3600)),
        _ => return Err(invalid()),
    };

    if duration.is_zero() {
        return Err(HistoryError::config("interval must be > 0"));
    }
    Ok(duration)
}
