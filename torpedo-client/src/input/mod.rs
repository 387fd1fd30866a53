//! Operator input handling
//!
//! Bounded line reading from the terminal and local command classification.

mod commands;
mod line;

pub use commands::LocalCommand;
pub use line::{LineReader, RawStdin};
