//! Logging setup
//!
//! Human-readable logs go to stderr. In debug mode a daily-rolling log file is
//! also written to `./.speechcraft/logs/`, and a fixed log file can be set in
//! the configuration.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_PREFIX: &str = "speechcraft.log";

/// Logging options assembled from CLI flags and configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    debug_mode: bool,
    level: String,
    log_dir: PathBuf,
    log_file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self {
            debug_mode: false,
            level: "info".to_string(),
            log_dir: get_log_dir(),
            log_file: None,
        }
    }

    pub fn with_debug_mode(mut self, debug: bool) -> Self {
        self.debug_mode = debug;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_log_file(mut self, file: Option<PathBuf>) -> Self {
        self.log_file = file;
        self
    }

    /// Filter directive used when `RUST_LOG` is not set
    fn directive(&self) -> String {
        if self.debug_mode {
            "speechcraft=debug,info".to_string()
        } else {
            format!("speechcraft={},warn", self.level)
        }
    }
}

fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directive()))
}

/// Stderr-only subscriber for the startup phase, before the configuration
/// that decides file output and level has been loaded
pub fn bootstrap_subscriber(config: &LogConfig) -> impl tracing::Subscriber + Send + Sync {
    fmt::Subscriber::builder()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(env_filter(config))
        .finish()
}

/// Install the global subscriber.
///
/// The returned guards flush the non-blocking file writers on drop, so the
/// caller must keep them alive for the whole run.
pub fn init_logging(config: LogConfig) -> Result<Vec<WorkerGuard>> {
    let filter = env_filter(&config);

    let mut guards = Vec::new();

    let rolling_layer = if config.debug_mode {
        std::fs::create_dir_all(&config.log_dir).with_context(|| {
            format!("Failed to create log directory: {}", config.log_dir.display())
        })?;
        let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);
        Some(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
    } else {
        None
    };

    let file_layer = match &config.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Log file path has no file name: {}", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            guards.push(guard);
            Some(fmt::layer().with_writer(writer).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(rolling_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    if config.debug_mode {
        tracing::debug!("Debug logging to {}", config.log_dir.display());
    }

    Ok(guards)
}

/// Directory used for debug-mode log files
pub fn get_log_dir() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".speechcraft")
        .join("logs")
}

/// Most recently modified log file, if any
pub fn get_log_path() -> Option<PathBuf> {
    newest_log_in(&get_log_dir())
}

/// Remove log files older than `days`. Returns how many were removed.
pub fn cleanup_old_logs(days: u64) -> Result<usize> {
    cleanup_logs_in(&get_log_dir(), days)
}

fn is_log_file(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX))
}

/// Log files written by this crate in `dir`
pub fn log_files_in(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_log_file(path))
        .collect();
    files.sort();
    files
}

fn newest_log_in(dir: &Path) -> Option<PathBuf> {
    log_files_in(dir)
        .into_iter()
        .filter_map(|path| {
            let modified = path.metadata().and_then(|m| m.modified()).ok()?;
            Some((modified, path))
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path)
}

fn cleanup_logs_in(dir: &Path, days: u64) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let max_age = Duration::from_secs(days * 24 * 60 * 60);
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read log directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if !is_log_file(&path) {
            continue;
        }
        let modified = path.metadata()?.modified()?;
        let age = now.duration_since(modified).unwrap_or_default();
        if age > max_age {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove log file: {}", path.display()))?;
            removed += 1;
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_follows_debug_flag() {
        let config = LogConfig::new().with_level("warn");
        assert_eq!(config.directive(), "speechcraft=warn,warn");

        let config = config.with_debug_mode(true);
        assert_eq!(config.directive(), "speechcraft=debug,info");
    }

    #[test]
    fn test_bootstrap_subscriber_follows_debug_flag() {
        tracing::subscriber::with_default(bootstrap_subscriber(&LogConfig::new()), || {
            assert!(tracing::enabled!(tracing::Level::INFO));
            assert!(!tracing::enabled!(tracing::Level::DEBUG));
        });

        let debug = LogConfig::new().with_debug_mode(true);
        tracing::subscriber::with_default(bootstrap_subscriber(&debug), || {
            assert!(tracing::enabled!(tracing::Level::DEBUG));
        });
    }

    #[test]
    fn test_cleanup_missing_dir_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(cleanup_logs_in(&missing, 7).unwrap(), 0);
    }

    #[test]
    fn test_cleanup_keeps_fresh_logs_and_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("speechcraft.log.2026-10-18"), "x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        assert_eq!(cleanup_logs_in(dir.path(), 7).unwrap(), 0);
        assert!(dir.path().join("speechcraft.log.2026-10-18").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_newest_log_ignores_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(newest_log_in(dir.path()).is_none());

        std::fs::write(dir.path().join("other.txt"), "x").unwrap();
        assert!(newest_log_in(dir.path()).is_none());

        std::fs::write(dir.path().join("speechcraft.log.2026-10-17"), "x").unwrap();
        let newest = newest_log_in(dir.path()).unwrap();
        assert!(newest.ends_with("speechcraft.log.2026-10-17"));
        assert_eq!(log_files_in(dir.path()).len(), 1);
    }
}
