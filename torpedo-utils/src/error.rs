//! Error types for torpedo
//!
//! Provides the unified error type used across the torpedo crates.

use std::path::PathBuf;

/// Main error type for torpedo operations
#[derive(Debug, thiserror::Error)]
pub enum TorpedoError {
    // === IO Errors ===

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Device Setup Errors ===

    #[error("Failed to open serial device {path}: {source}")]
    DeviceOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to configure serial device {path}: {source}")]
    DeviceConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unsupported baud rate: {0}")]
    UnsupportedBaud(u32),

    #[error("Failed to install {signal} handler: {source}")]
    SignalHandler {
        signal: &'static str,
        source: std::io::Error,
    },

    // === Session I/O Errors ===

    #[error("Readiness wait failed: {0}")]
    Wait(#[source] std::io::Error),

    #[error("Serial read error: {0}")]
    DeviceRead(#[source] std::io::Error),

    #[error("Serial write error: {0}")]
    DeviceWrite(#[source] std::io::Error),

    #[error("Serial drain error: {0}")]
    DeviceDrain(#[source] std::io::Error),

    #[error("Serial device hung up")]
    DeviceHangup,

    // === Configuration Errors ===

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    // === Internal Errors ===

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TorpedoError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error can only happen before the event loop starts
    pub fn is_fatal_at_startup(&self) -> bool {
        matches!(
            self,
            Self::FileRead { .. }
                | Self::DeviceOpen { .. }
                | Self::DeviceConfig { .. }
                | Self::UnsupportedBaud(_)
                | Self::SignalHandler { .. }
                | Self::Config(_)
                | Self::ConfigInvalid { .. }
                | Self::ConfigNotFound(_)
        )
    }

    /// Process exit status for an error that reached `main`.
    ///
    /// Only setup failures are reported as failure; an I/O error that ends a
    /// running session still leads to an orderly close and a zero status.
    pub fn exit_code(&self) -> u8 {
        if self.is_fatal_at_startup() {
            1
        } else {
            0
        }
    }
}

/// Result type alias using TorpedoError
pub type Result<T> = std::result::Result<T, TorpedoError>;
