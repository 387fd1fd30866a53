//! Shutdown coordination
//!
//! Signal handlers only flip an atomic flag; the event loop polls it at the
//! top of every iteration and after every interrupted wait. On the way out
//! the device is optionally asked to restart before the port is closed.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signal_hook::consts::{SIGINT, SIGTERM};

use torpedo_utils::{Result, TorpedoError};

use crate::console::Console;
use crate::transport::Device;

/// Directive sent to the device during a restart-on-exit shutdown
pub const RESTART_DIRECTIVE: &[u8] = b"restart\n";

/// Process-wide request to stop the event loop
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Route SIGINT and SIGTERM to `flag`.
///
/// SIGINT is required; a SIGTERM failure is only logged.
pub fn install_signal_handlers(flag: &ShutdownFlag) -> Result<()> {
    signal_hook::flag::register(SIGINT, Arc::clone(&flag.0))
        .map_err(|source| TorpedoError::SignalHandler {
            signal: "SIGINT",
            source,
        })?;

    if let Err(e) = signal_hook::flag::register(SIGTERM, Arc::clone(&flag.0)) {
        tracing::warn!("Failed to install SIGTERM handler: {}", e);
        eprintln!("Warning: failed to install SIGTERM handler: {}", e);
    }

    tracing::debug!("Signal handlers installed");
    Ok(())
}

/// How the final restart handshake went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// No restart was pending
    Skipped,
    /// Directive written and fully transmitted
    Sent,
    WriteFailed,
    DrainFailed,
}

/// Send the restart directive if one is pending, then wait for it to drain.
///
/// Failures are reported but never propagated: the caller closes the port
/// regardless.
pub fn final_handshake<D: Device, W: Write>(
    device: &mut D,
    pending_restart: bool,
    console: &mut Console<W>,
) -> HandshakeOutcome {
    if !pending_restart {
        return HandshakeOutcome::Skipped;
    }

    if let Err(e) = device.write_all(RESTART_DIRECTIVE) {
        let err = TorpedoError::DeviceWrite(e);
        tracing::error!("Restart handshake failed: {}", err);
        eprintln!("{} (restart)", err);
        return HandshakeOutcome::WriteFailed;
    }

    if let Err(e) = device.drain() {
        let err = TorpedoError::DeviceDrain(e);
        tracing::error!("Restart handshake failed: {}", err);
        eprintln!("{}", err);
        return HandshakeOutcome::DrainFailed;
    }

    tracing::info!("Restart directive sent and drained");
    if let Err(e) = console.restart_sent() {
        tracing::warn!("Failed to print restart confirmation: {}", e);
    }
    HandshakeOutcome::Sent
}
