//! torpedo - terminal bridge to a serial-attached torpedo game
//!
//! Opens the game device in raw mode, echoes everything it sends, and
//! forwards the operator's lines to it. A few words (`help`, `exit`,
//! `restart`) are interpreted locally.

use std::io;
use std::process::ExitCode;

use torpedo_utils::{init_logging_with_config, LogConfig, Result, TorpedoError};

mod cli;
mod config;
mod console;
mod input;
mod poller;
mod session;
mod shutdown;
#[cfg(test)]
mod testing;
mod transport;

use cli::Args;
use config::ClientConfig;
use console::Console;
use input::{LineReader, RawStdin};
use poller::FdPoller;
use session::{Finished, LoopExit, Session, SessionOptions};
use shutdown::{install_signal_handlers, ShutdownFlag};
use transport::SerialPort;

fn main() -> ExitCode {
    let args = Args::parse_args();

    let log_config = if args.verbose {
        LogConfig::development()
    } else {
        LogConfig::client()
    };
    if let Err(e) = init_logging_with_config(log_config) {
        eprintln!("Warning: logging disabled: {}", e);
    }
    tracing::info!("torpedo client starting");
    tracing::debug!("CLI args: {:?}", args);

    match run(args) {
        Ok(exit) => {
            tracing::info!(?exit, "torpedo client exiting normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(exit_code = e.exit_code(), "torpedo client error: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(args: Args) -> Result<LoopExit> {
    let mut config = ClientConfig::load(args.config.as_deref())?;
    config.apply_args(&args);
    config.validate()?;

    let port = SerialPort::open(&config.device_path, config.baud_rate)?;

    // On failure `port` is dropped here, which closes it
    let shutdown = ShutdownFlag::new();
    install_signal_handlers(&shutdown)?;

    let mut console = Console::new(io::stdout());
    console.banner(port.path(), config.baud_rate)?;
    if !args.no_manual {
        console.manual()?;
    }

    let device_fd = port
        .try_clone_fd()
        .map_err(|source| TorpedoError::DeviceConfig {
            path: config.device_path.clone(),
            source,
        })?;
    let poller = FdPoller::new(device_fd, RawStdin);
    let mut session = Session::new(
        port,
        poller,
        LineReader::new(RawStdin, config.max_line_length),
        console,
        shutdown,
        SessionOptions::from(&config),
    );

    let outcome = session.run();
    if let Err(e) = &outcome {
        tracing::error!("Event loop stopped: {}", e);
    }
    tracing::debug!(pending_restart = session.pending_restart(), "Leaving session");

    let Finished {
        device,
        mut console,
        handshake,
    } = session.finish();
    tracing::debug!(?handshake, "Final handshake complete");

    device.close();
    if let Err(e) = console.closed() {
        tracing::warn!("Failed to print close notice: {}", e);
    }

    outcome
}
