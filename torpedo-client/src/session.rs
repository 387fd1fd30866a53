//! The client event loop
//!
//! One thread, one bounded readiness wait per iteration. Device bytes go
//! straight to the console; operator lines go through the local command
//! interpreter and may be forwarded to the device. The loop exits when the
//! shutdown flag is observed or on a fatal I/O error.

use std::io::{Read, Write};
use std::time::Duration;

use torpedo_utils::{Result, TorpedoError};

use crate::config::ClientConfig;
use crate::console::Console;
use crate::input::{LineReader, LocalCommand};
use crate::poller::{Poller, WaitOutcome};
use crate::shutdown::{final_handshake, HandshakeOutcome, ShutdownFlag};
use crate::transport::Device;

/// Bytes read from the device per readiness event
const DEVICE_CHUNK: usize = 256;

/// Consecutive end-of-stream reads on the operator input before giving up
const EOF_STOP_THRESHOLD: u32 = 3;

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// A signal (or another holder of the flag) requested shutdown
    ShutdownRequested,
    /// The operator typed `exit` or `quit`
    OperatorExit,
    /// The operator's input stream kept reporting end-of-file
    InputClosed,
}

/// Session behavior knobs taken from the config
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub poll_interval: Duration,
    pub restart_on_exit: bool,
}

impl From<&ClientConfig> for SessionOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            restart_on_exit: config.restart_on_exit,
        }
    }
}

/// Everything handed back after the loop and the final handshake
#[derive(Debug)]
pub struct Finished<D, W> {
    pub device: D,
    pub console: Console<W>,
    pub handshake: HandshakeOutcome,
}

enum Flow {
    Continue,
    Stop(LoopExit),
}

/// A running bridge between one device and one operator
pub struct Session<D, P, R, W> {
    device: D,
    poller: P,
    input: LineReader<R>,
    console: Console<W>,
    shutdown: ShutdownFlag,
    options: SessionOptions,
    pending_restart: bool,
    eof_streak: u32,
}

impl<D, P, R, W> Session<D, P, R, W>
where
    D: Device,
    P: Poller,
    R: Read,
    W: Write,
{
    pub fn new(
        device: D,
        poller: P,
        input: LineReader<R>,
        console: Console<W>,
        shutdown: ShutdownFlag,
        options: SessionOptions,
    ) -> Self {
        Self {
            device,
            poller,
            input,
            console,
            shutdown,
            options,
            pending_restart: false,
            eof_streak: 0,
        }
    }

    /// Whether the restart directive will be sent on the way out
    pub fn pending_restart(&self) -> bool {
        self.pending_restart
    }

    /// Run until shutdown is requested or a fatal error occurs.
    pub fn run(&mut self) -> Result<LoopExit> {
        loop {
            if self.shutdown.is_requested() {
                tracing::info!("Shutdown requested, leaving event loop");
                return Ok(LoopExit::ShutdownRequested);
            }

            let readiness = match self
                .poller
                .wait(self.options.poll_interval)
                .map_err(TorpedoError::Wait)?
            {
                WaitOutcome::Interrupted => {
                    tracing::debug!("Readiness wait interrupted by signal");
                    continue;
                }
                WaitOutcome::Ready(readiness) => readiness,
            };

            if readiness.device {
                self.pump_device(readiness.device_hangup)?;
            }

            if readiness.operator {
                if let Flow::Stop(exit) = self.pump_operator()? {
                    return Ok(exit);
                }
            }
        }
    }

    /// Perform the final handshake and hand the device back for closing.
    pub fn finish(mut self) -> Finished<D, W> {
        let handshake = final_handshake(&mut self.device, self.pending_restart, &mut self.console);
        Finished {
            device: self.device,
            console: self.console,
            handshake,
        }
    }

    fn pump_device(&mut self, hangup: bool) -> Result<()> {
        let mut chunk = [0u8; DEVICE_CHUNK];
        let n = self.device.read(&mut chunk).map_err(TorpedoError::DeviceRead)?;
        if n > 0 {
            tracing::trace!(bytes = n, "Device output");
            self.console.device_output(&chunk[..n])?;
        } else if hangup {
            // Output still buffered before the hang-up has been read by now
            return Err(TorpedoError::DeviceHangup);
        }
        Ok(())
    }

    fn pump_operator(&mut self) -> Result<Flow> {
        let read = match self.input.read_available() {
            Ok(read) => read,
            Err(e) => {
                tracing::warn!("Operator input read failed: {}", e);
                return Ok(Flow::Continue);
            }
        };

        for line in &read.lines {
            if let Flow::Stop(exit) = self.handle_line(line)? {
                return Ok(Flow::Stop(exit));
            }
        }

        if !read.end_of_stream {
            self.eof_streak = 0;
            return Ok(Flow::Continue);
        }

        self.eof_streak += 1;
        tracing::debug!(streak = self.eof_streak, "Operator input at end of stream");
        if self.eof_streak >= EOF_STOP_THRESHOLD {
            tracing::info!("Operator input closed, shutting down");
            self.shutdown.request();
            return Ok(Flow::Stop(LoopExit::InputClosed));
        }
        Ok(Flow::Continue)
    }

    fn handle_line(&mut self, line: &str) -> Result<Flow> {
        let Some(command) = LocalCommand::classify(line) else {
            return Ok(Flow::Continue);
        };

        match &command {
            LocalCommand::Help => {
                self.console.manual()?;
            }
            LocalCommand::Exit => {
                if self.options.restart_on_exit {
                    self.pending_restart = true;
                }
                tracing::info!(restart = self.pending_restart, "Exit requested by operator");
                self.console.exit_notice(self.pending_restart)?;
                self.shutdown.request();
                return Ok(Flow::Stop(LoopExit::OperatorExit));
            }
            LocalCommand::Restart(_) | LocalCommand::Forward(_) => {
                // `restart` is forwarded live and armed again for shutdown
                if command.arms_restart() {
                    self.pending_restart = true;
                }
                if let Some(text) = command.payload() {
                    self.forward(text)?;
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn forward(&mut self, text: &str) -> Result<()> {
        let mut frame = Vec::with_capacity(text.len() + 1);
        frame.extend_from_slice(text.as_bytes());
        frame.push(b'\n');

        self.device.write_all(&frame).map_err(TorpedoError::DeviceWrite)?;
        tracing::debug!(text, "Forwarded line to device");
        self.console.sent(text)?;
        Ok(())
    }
}
