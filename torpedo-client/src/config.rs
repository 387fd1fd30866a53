//! Client startup configuration
//!
//! Defaults are layered under the TOML config file, which is layered under
//! command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use torpedo_utils::{Result, TorpedoError};

use crate::cli::Args;

/// Shortest line buffer that still holds one byte plus the terminator
const MIN_LINE_LENGTH: usize = 2;
const MAX_LINE_LENGTH: usize = 4096;
const MAX_POLL_INTERVAL_MS: u64 = 1000;

/// Settings for one client session
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Serial device node
    pub device_path: PathBuf,
    /// Transport speed
    pub baud_rate: u32,
    /// Operator line bound, terminator included
    pub max_line_length: usize,
    /// Ceiling on one readiness wait
    pub poll_interval_ms: u64,
    /// Ask the device to restart when the operator exits
    pub restart_on_exit: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            device_path: PathBuf::from("/dev/ttyACM0"),
            baud_rate: 115200,
            max_line_length: 128,
            poll_interval_ms: 100,
            restart_on_exit: true,
        }
    }
}

impl ClientConfig {
    /// Load the config file.
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => (torpedo_utils::config_file(), false),
        };

        if !path.exists() {
            if required {
                return Err(TorpedoError::ConfigNotFound(path));
            }
            tracing::debug!("Config file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| TorpedoError::FileRead {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml_str(&content, &path)?;
        tracing::debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Parse TOML content; `path` is only used for error reporting.
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| TorpedoError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Overlay command-line flags.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(device) = &args.device {
            self.device_path = device.clone();
        }
        if let Some(baud) = args.baud {
            self.baud_rate = baud;
        }
        if let Some(max) = args.max_line_length {
            self.max_line_length = max;
        }
        if let Some(interval) = args.poll_interval_ms {
            self.poll_interval_ms = interval;
        }
        if args.no_restart_on_exit {
            self.restart_on_exit = false;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_LINE_LENGTH..=MAX_LINE_LENGTH).contains(&self.max_line_length) {
            return Err(TorpedoError::config(format!(
                "max_line_length must be between {} and {}, got {}",
                MIN_LINE_LENGTH, MAX_LINE_LENGTH, self.max_line_length
            )));
        }
        if !(1..=MAX_POLL_INTERVAL_MS).contains(&self.poll_interval_ms) {
            return Err(TorpedoError::config(format!(
                "poll_interval_ms must be between 1 and {}, got {}",
                MAX_POLL_INTERVAL_MS, self.poll_interval_ms
            )));
        }
        if self.device_path.as_os_str().is_empty() {
            return Err(TorpedoError::config("device_path must not be empty"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
