//! Command-line argument parsing for the torpedo client
//!
//! Uses clap for argument parsing with derive macros. Every option left
//! unset falls back to the config file, then to built-in defaults.

use clap::Parser;
use std::path::PathBuf;

/// torpedo - terminal bridge to a serial-attached torpedo game
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Serial device to open
    #[arg(long, short = 'd', env = "TORPEDO_DEVICE")]
    pub device: Option<PathBuf>,

    /// Transport speed in baud
    #[arg(long, short = 'b', env = "TORPEDO_BAUD")]
    pub baud: Option<u32>,

    /// Maximum operator line length, terminator included
    ///
    /// Longer lines are truncated before being interpreted or forwarded.
    #[arg(long)]
    pub max_line_length: Option<usize>,

    /// Upper bound on a single readiness wait, in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Config file path (defaults to $XDG_CONFIG_HOME/torpedo/config.toml)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Do not ask the device to restart when leaving with exit/quit
    #[arg(long, default_value_t = false)]
    pub no_restart_on_exit: bool,

    /// Skip the manual at startup
    #[arg(long, default_value_t = false)]
    pub no_manual: bool,

    /// Verbose diagnostics on stderr instead of the log file
    #[arg(long, short = 'v', default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
