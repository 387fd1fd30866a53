//! Local command interpretation
//!
//! Operator lines are either handled by the client itself or forwarded to
//! the device verbatim.

/// What to do with one line of operator input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalCommand {
    /// `?` or `help`: print the manual
    Help,
    /// `exit` or `quit`: leave, asking the device to restart on the way out
    Exit,
    /// `restart`: forwarded to the device and also armed for shutdown
    Restart(String),
    /// Anything else, sent to the device as typed
    Forward(String),
}

impl LocalCommand {
    /// Classify a raw line. Blank lines yield `None`.
    pub fn classify(raw: &str) -> Option<Self> {
        let line = raw.trim_matches(is_line_space);
        if line.is_empty() {
            return None;
        }

        let command = if line == "?" || line.eq_ignore_ascii_case("help") {
            Self::Help
        } else if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            Self::Exit
        } else if line.eq_ignore_ascii_case("restart") {
            Self::Restart(line.to_string())
        } else {
            Self::Forward(line.to_string())
        };
        Some(command)
    }

    /// Text to send to the device, if this command forwards anything
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Restart(text) | Self::Forward(text) => Some(text),
            Self::Help | Self::Exit => None,
        }
    }

    /// Whether this command arms the restart directive for shutdown
    pub fn arms_restart(&self) -> bool {
        matches!(self, Self::Exit | Self::Restart(_))
    }
}

/// ASCII whitespace including vertical tab; other Unicode spaces are content
fn is_line_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}
