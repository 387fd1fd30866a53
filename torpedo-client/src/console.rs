//! Operator-facing transcript
//!
//! Everything written here is flushed immediately, so device output and
//! local echoes appear in the order the event loop handled them.

use std::io::{self, Write};
use std::path::Path;

const RULE: &str = "---------------------------";

/// Session transcript printer
#[derive(Debug)]
pub struct Console<W> {
    out: W,
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Startup banner naming the opened port
    pub fn banner(&mut self, device: &Path, baud: u32) -> io::Result<()> {
        writeln!(self.out, "--- TORPEDO GAME CLIENT ---")?;
        writeln!(
            self.out,
            "Port {} opened at {} Baud. Enter commands (e.g., '10 10 2 1 1' or 'restart').",
            device.display(),
            baud
        )?;
        writeln!(self.out, "Press CTRL+C to quit.")?;
        writeln!(self.out, "{}", RULE)?;
        self.out.flush()
    }

    /// Static help block for local commands and example payloads
    pub fn manual(&mut self) -> io::Result<()> {
        write!(
            self.out,
            "\n--- Torpedo Game Manual ---\n\
             Local commands (typed in the terminal):\n  \
             ? or help      - show this manual\n  \
             exit or quit   - exit the program (asks the device to restart)\n\n\
             To send commands to the device, type them and press Enter\n\
             Examples:\n  \
             10 10 2 1 1     - send numbers/commands to the device\n  \
             restart         - restart the game\n  \
             hit rate        - print the current game hit rate\n\
             {}\n\n",
            RULE
        )?;
        self.out.flush()
    }

    /// Raw bytes from the device, verbatim
    pub fn device_output(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.out.write_all(bytes)?;
        self.out.flush()
    }

    /// Confirmation after forwarding `text` to the device
    pub fn sent(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, ">> Sent: {}", text)?;
        self.out.flush()
    }

    pub fn exit_notice(&mut self, restart_armed: bool) -> io::Result<()> {
        if restart_armed {
            writeln!(self.out, "Exiting by user request (will request device restart)...")?;
        } else {
            writeln!(self.out, "Exiting by user request...")?;
        }
        self.out.flush()
    }

    pub fn restart_sent(&mut self) -> io::Result<()> {
        writeln!(self.out, ">> Sent 'restart' to device and drained output")?;
        self.out.flush()
    }

    pub fn closed(&mut self) -> io::Result<()> {
        writeln!(self.out, "\nSerial port closed. Exiting.")?;
        self.out.flush()
    }
}
