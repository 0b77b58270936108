use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Where and how log output is written.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Directory of the daily rotated log files
    pub log_dir: Utf8PathBuf,
    /// File name prefix, e.g. "autodiscard"
    pub log_prefix: String,
    /// Debug level instead of info, unless `RUST_LOG` says otherwise
    pub debug_mode: bool,
    /// Mirror output to stderr
    pub console_output: bool,
    /// One JSON object per line in the log file
    pub json: bool,
}

impl LogOptions {
    pub fn new(log_dir: impl Into<Utf8PathBuf>, log_prefix: impl Into<String>) -> Self {
        Self {
            log_dir: log_dir.into(),
            log_prefix: log_prefix.into(),
            debug_mode: false,
            console_output: false,
            json: false,
        }
    }

    pub fn debug(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    pub fn console(mut self, console_output: bool) -> Self {
        self.console_output = console_output;
        self
    }

    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

/// Setup logging with rotating file appender.
///
/// # Returns
/// A guard that must be held for the duration of the program to keep logging active
pub fn setup_logging(
    log_dir: &str,
    log_prefix: &str,
    debug_mode: bool,
) -> Result<WorkerGuard> {
    init(&LogOptions::new(log_dir, log_prefix).debug(debug_mode))
}

/// Install the global subscriber described by `options`.
///
/// Fails when the log directory cannot be created or a subscriber is already installed.
pub fn init(options: &LogOptions) -> Result<WorkerGuard> {
    if !options.log_dir.exists() {
        fs::create_dir_all(&options.log_dir)
            .with_context(|| format!("Failed to create log directory: {}", options.log_dir))?;
    }

    let file_appender = rolling::daily(&options.log_dir, &options.log_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if options.debug_mode { "debug" } else { "info" }));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);
    let file_layer = if options.json {
        file_layer.json().boxed()
    } else {
        file_layer.boxed()
    };

    let console_layer = options.console_output.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    tracing::info!(
        dir = %options.log_dir,
        prefix = %options.log_prefix,
        debug = options.debug_mode,
        console = options.console_output,
        json = options.json,
        "Logging initialized"
    );

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_options_builder() {
        let options = LogOptions::new("logs", "autodiscard").debug(true).json(true);

        assert_eq!(options.log_dir, Utf8PathBuf::from("logs"));
        assert!(options.debug_mode);
        assert!(options.json);
        assert!(!options.console_output);
    }

    #[test]
    fn test_init_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = Utf8PathBuf::try_from(temp_dir.path().join("logs")).unwrap();

        // May fail if another test installed a subscriber first; the directory
        // is created before that point either way.
        let _ = init(&LogOptions::new(log_dir.clone(), "test"));

        assert!(log_dir.exists());
    }

    #[test]
    fn test_second_setup_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().to_str().unwrap();

        let first = setup_logging(log_dir, "first", true);
        let second = setup_logging(log_dir, "second", true);

        // At most one of them can own the global subscriber
        assert!(first.is_err() || second.is_err());
    }
}
