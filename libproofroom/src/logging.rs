//! Logging setup shared by the proofroom binaries
//!
//! Binaries resolve their logging settings from the environment once at
//! startup and install a `tracing-subscriber` writing to stderr, keeping
//! stdout pipeable. `PROOFROOM_LOG_FORMAT` picks the output shape and
//! `PROOFROOM_LOG_LEVEL` the default filter; `RUST_LOG` still wins when set.

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

/// Output shape of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Plain text, one event per line.
    #[default]
    Text,
    /// One JSON object per line, for log shippers.
    Json,
    /// Multi-line colored output for development.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!(
                "unknown log format '{}' (expected text, json, or pretty)",
                other
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}

/// Logging settings, normally resolved from the environment.
pub struct LoggingConfig {
    pub format: LogFormat,
    pub filter: String,
}

impl LoggingConfig {
    /// Read `PROOFROOM_LOG_FORMAT` and `PROOFROOM_LOG_LEVEL`, falling back
    /// to text at info level. An unparseable format falls back to text.
    pub fn from_env() -> Self {
        let format = std::env::var("PROOFROOM_LOG_FORMAT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        let filter =
            std::env::var("PROOFROOM_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        Self { format, filter }
    }

    /// Raise the filter to debug. Wired to the binaries' `--verbose` flag.
    pub fn verbose(mut self, verbose: bool) -> Self {
        if verbose {
            self.filter = "debug".to_string();
        }
        self
    }

    /// Install the subscriber. Call once per process; a second call panics.
    pub fn init(self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.filter));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);

        match self.format {
            LogFormat::Text => builder.with_target(false).init(),
            LogFormat::Json => builder.json().init(),
            LogFormat::Pretty => builder.pretty().init(),
        }
    }
}

/// Install logging from the environment alone, for embedders without a
/// verbose flag of their own.
pub fn init_default() {
    LoggingConfig::from_env().init();
}
