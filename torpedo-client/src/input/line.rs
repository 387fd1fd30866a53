//! Bounded line reading from the operator's terminal
//!
//! Each readiness event triggers exactly one `read(2)`; complete lines are
//! split out by [`LineAssembler`], which never buffers more than
//! `max_line_length - 1` bytes of content.

use std::io::{self, Read};

use rustix::fd::{AsFd, BorrowedFd};

/// Bytes requested from the operator stream per readiness event
const READ_CHUNK: usize = 256;

/// Accumulates raw bytes into newline-terminated lines.
///
/// Content beyond the bound is dropped up to the next newline, so an
/// overlong line is delivered truncated rather than split in two.
#[derive(Debug)]
pub struct LineAssembler {
    max_content: usize,
    pending: Vec<u8>,
    truncated: bool,
}

impl LineAssembler {
    /// `max_line_length` counts the terminator, matching a C line buffer.
    pub fn new(max_line_length: usize) -> Self {
        let max_content = max_line_length.saturating_sub(1).max(1);
        Self {
            max_content,
            pending: Vec::with_capacity(max_content),
            truncated: false,
        }
    }

    /// Longest line content that will be delivered intact
    #[cfg(test)]
    pub fn max_content(&self) -> usize {
        self.max_content
    }

    /// Feed bytes, appending every completed line to `out`.
    pub fn push(&mut self, bytes: &[u8], out: &mut Vec<String>) {
        for &byte in bytes {
            if byte == b'\n' {
                out.push(self.take_line());
            } else if self.pending.len() < self.max_content {
                self.pending.push(byte);
            } else {
                self.truncated = true;
            }
        }
    }

    /// Flush a partial line left over at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() && !self.truncated {
            return None;
        }
        Some(self.take_line())
    }

    fn take_line(&mut self) -> String {
        if self.truncated {
            tracing::warn!(
                limit = self.max_content,
                "Operator line exceeded maximum length, truncated"
            );
        }
        self.truncated = false;
        let bytes = std::mem::replace(&mut self.pending, Vec::with_capacity(self.max_content));
        decode_line(bytes)
    }
}

/// Decode a line, dropping a multi-byte sequence cut short by truncation.
fn decode_line(mut bytes: Vec<u8>) -> String {
    if let Err(e) = std::str::from_utf8(&bytes) {
        if e.error_len().is_none() {
            bytes.truncate(e.valid_up_to());
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// What one read from the operator stream produced
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReadLines {
    /// Complete lines, in the order they were typed
    pub lines: Vec<String>,
    /// The stream reported end-of-file
    pub end_of_stream: bool,
}

/// Reads operator input one chunk per call
#[derive(Debug)]
pub struct LineReader<R> {
    reader: R,
    assembler: LineAssembler,
}

impl<R: Read> LineReader<R> {
    pub fn new(reader: R, max_line_length: usize) -> Self {
        Self {
            reader,
            assembler: LineAssembler::new(max_line_length),
        }
    }

    /// Perform one read and return the lines it completed.
    pub fn read_available(&mut self) -> io::Result<ReadLines> {
        let mut chunk = [0u8; READ_CHUNK];
        let n = match self.reader.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if matches!(e.kind(), io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock) => {
                return Ok(ReadLines::default());
            }
            Err(e) => return Err(e),
        };

        let mut lines = Vec::new();
        if n == 0 {
            lines.extend(self.assembler.finish());
            return Ok(ReadLines {
                lines,
                end_of_stream: true,
            });
        }

        self.assembler.push(&chunk[..n], &mut lines);
        Ok(ReadLines {
            lines,
            end_of_stream: false,
        })
    }
}

/// Unbuffered stdin.
///
/// `std::io::Stdin` keeps its own buffer, which can hold a line that
/// `poll(2)` no longer reports as readable.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawStdin;

impl Read for RawStdin {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(rustix::io::read(rustix::stdio::stdin(), buf)?)
    }
}

impl AsFd for RawStdin {
    fn as_fd(&self) -> BorrowedFd<'_> {
        rustix::stdio::stdin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Hands out one scripted chunk per read call
    struct ChunkedReader {
        chunks: VecDeque<io::Result<Vec<u8>>>,
    }

    impl ChunkedReader {
        fn new(chunks: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                chunks: chunks.into(),
            }
        }
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(Ok(chunk)) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    fn assemble(max: usize, input: &[u8]) -> Vec<String> {
        let mut assembler = LineAssembler::new(max);
        let mut out = Vec::new();
        assembler.push(input, &mut out);
        out
    }

    // ==================== LineAssembler ====================

    #[test]
    fn test_single_line() {
        assert_eq!(assemble(128, b"10 10 2 1 1\n"), vec!["10 10 2 1 1"]);
    }

    #[test]
    fn test_multiple_lines_in_one_push() {
        assert_eq!(assemble(128, b"help\nrestart\n"), vec!["help", "restart"]);
    }

    #[test]
    fn test_partial_line_waits_for_newline() {
        let mut assembler = LineAssembler::new(128);
        let mut out = Vec::new();

        assembler.push(b"hit ", &mut out);
        assert!(out.is_empty());

        assembler.push(b"rate\n", &mut out);
        assert_eq!(out, vec!["hit rate"]);
    }

    #[test]
    fn test_line_at_limit_is_kept_whole() {
        let line = "x".repeat(127);
        let input = format!("{}\n", line);
        assert_eq!(assemble(128, input.as_bytes()), vec![line]);
    }

    #[test]
    fn test_overlong_line_is_truncated_at_limit() {
        let input = format!("{}\n", "y".repeat(500));
        let lines = assemble(128, input.as_bytes());

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 127);
    }

    #[test]
    fn test_truncation_does_not_leak_into_next_line() {
        let input = format!("{}\nquit\n", "z".repeat(300));
        let lines = assemble(16, input.as_bytes());

        assert_eq!(lines, vec!["z".repeat(15), "quit".to_string()]);
    }

    #[test]
    fn test_buffer_never_exceeds_bound() {
        let mut assembler = LineAssembler::new(8);
        let mut out = Vec::new();
        for _ in 0..100 {
            assembler.push(b"0123456789", &mut out);
            assert!(assembler.pending.len() <= assembler.max_content());
        }
        assert!(out.is_empty());
    }

    #[test]
    fn test_truncation_keeps_utf8_intact() {
        // 'é' is two bytes; a 4-byte budget would split the second one
        let lines = assemble(5, "aéé\n".as_bytes());
        assert_eq!(lines, vec!["aé"]);
    }

    #[test]
    fn test_degenerate_limit_still_holds_one_byte() {
        let assembler = LineAssembler::new(0);
        assert_eq!(assembler.max_content(), 1);
    }

    #[test]
    fn test_finish_flushes_partial_line() {
        let mut assembler = LineAssembler::new(128);
        let mut out = Vec::new();
        assembler.push(b"exit", &mut out);

        assert_eq!(assembler.finish(), Some("exit".to_string()));
        assert_eq!(assembler.finish(), None);
    }

    // ==================== LineReader ====================

    #[test]
    fn test_reader_returns_lines_per_read() {
        let reader = ChunkedReader::new(vec![Ok(b"he".to_vec()), Ok(b"lp\n".to_vec())]);
        let mut lines = LineReader::new(reader, 128);

        assert_eq!(lines.read_available().unwrap(), ReadLines::default());
        assert_eq!(lines.read_available().unwrap().lines, vec!["help"]);
    }

    #[test]
    fn test_reader_end_of_stream_flushes_partial() {
        let reader = ChunkedReader::new(vec![Ok(b"quit".to_vec())]);
        let mut lines = LineReader::new(reader, 128);

        assert!(lines.read_available().unwrap().lines.is_empty());
        let last = lines.read_available().unwrap();
        assert!(last.end_of_stream);
        assert_eq!(last.lines, vec!["quit"]);
    }

    #[test]
    fn test_reader_interrupted_is_no_input() {
        let reader = ChunkedReader::new(vec![Err(io::Error::from(io::ErrorKind::Interrupted))]);
        let mut lines = LineReader::new(reader, 128);

        assert_eq!(lines.read_available().unwrap(), ReadLines::default());
    }

    #[test]
    fn test_reader_propagates_real_errors() {
        let reader = ChunkedReader::new(vec![Err(io::Error::new(io::ErrorKind::Other, "eio"))]);
        let mut lines = LineReader::new(reader, 128);

        assert!(lines.read_available().is_err());
    }
}
