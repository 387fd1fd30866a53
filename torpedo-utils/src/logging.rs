//! Logging infrastructure for torpedo
//!
//! Provides unified logging setup using the tracing ecosystem. The operator
//! transcript owns stdout, so the client logs to a file by default.

use std::fs::File;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{paths, Result, TorpedoError};

/// Environment variable overriding the log filter
pub const LOG_ENV: &str = "TORPEDO_LOG";

/// Log output destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Log to stderr
    Stderr,
    /// Log to file under the state directory
    File,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output destination
    pub output: LogOutput,
    /// Log level filter (e.g., "info", "torpedo_client=debug")
    pub filter: String,
    /// Include file/line in logs
    pub file_line: bool,
    /// Optional custom log file name (defaults to "torpedo.log")
    pub file_name: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            output: LogOutput::Stderr,
            filter: "info".into(),
            file_line: false,
            file_name: None,
        }
    }
}

impl LogConfig {
    /// Create config for the interactive client (file logging)
    pub fn client() -> Self {
        Self {
            output: LogOutput::File,
            filter: std::env::var(LOG_ENV).unwrap_or_else(|_| "info".into()),
            file_line: false,
            file_name: None,
        }
    }

    /// Create config for development (verbose stderr)
    pub fn development() -> Self {
        Self {
            output: LogOutput::Stderr,
            filter: std::env::var(LOG_ENV).unwrap_or_else(|_| "debug".into()),
            file_line: true,
            file_name: None,
        }
    }

    fn log_file_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or("torpedo.log")
    }
}

/// Initialize logging with custom configuration
pub fn init_logging_with_config(config: LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| TorpedoError::config(format!("Invalid log filter: {}", e)))?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_file(config.file_line)
        .with_line_number(config.file_line);

    let registry = tracing_subscriber::registry().with(filter);

    let init = match config.output {
        LogOutput::Stderr => registry.with(fmt_layer.with_writer(std::io::stderr)).try_init(),
        LogOutput::File => {
            let file = open_log_file(config.log_file_name())?;
            registry
                .with(fmt_layer.with_writer(file).with_ansi(false))
                .try_init()
        }
    };

    init.map_err(|e| TorpedoError::internal(format!("Failed to init logging: {}", e)))
}

fn open_log_file(file_name: &str) -> Result<File> {
    let log_dir = paths::log_dir();
    paths::ensure_dir(&log_dir).map_err(|e| TorpedoError::FileWrite {
        path: log_dir.clone(),
        source: e,
    })?;

    let log_path = log_dir.join(file_name);
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| TorpedoError::FileWrite {
            path: log_path,
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.output, LogOutput::Stderr);
        assert_eq!(config.filter, "info");
        assert!(!config.file_line);
        assert_eq!(config.log_file_name(), "torpedo.log");
    }

    #[test]
    fn test_log_config_client_logs_to_file() {
        // stdout and stderr belong to the operator transcript
        let config = LogConfig::client();
        assert_eq!(config.output, LogOutput::File);
        assert!(!config.file_line);
    }

    #[test]
    fn test_log_config_development() {
        let config = LogConfig::development();
        assert_eq!(config.output, LogOutput::Stderr);
        assert!(config.file_line);
    }

    #[test]
    fn test_custom_file_name() {
        let config = LogConfig {
            file_name: Some("bench.log".into()),
            ..LogConfig::default()
        };
        assert_eq!(config.log_file_name(), "bench.log");
    }

    #[test]
    fn test_invalid_filter_is_config_error() {
        let config = LogConfig {
            filter: "torpedo=notalevel".into(),
            ..LogConfig::default()
        };
        let err = init_logging_with_config(config).unwrap_err();
        assert!(matches!(err, TorpedoError::Config(_)));
    }

    // A successful init is not exercised here: the global subscriber can only
    // be installed once per test process.
}
