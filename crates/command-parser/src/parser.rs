//! Bounded line accumulator for inbound command bytes

use crate::error::RateError;
use crate::rate::SampleRate;
use tracing::{debug, trace};

/// Maximum bytes buffered for a single command line
pub const LINE_CAPACITY: usize = 32;

/// Result of a completed command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Line held a valid rate; the caller should apply it
    Applied(SampleRate),
    /// Line was discarded
    Rejected(RateError),
}

/// Accumulates bytes until `\n` or `\r`, then parses the line as a rate.
///
/// Bytes beyond [`LINE_CAPACITY`] are never written; the whole line is
/// discarded instead and the parser resynchronizes at the next terminator.
#[derive(Debug, Default)]
pub struct CommandParser {
    line: heapless::Vec<u8, LINE_CAPACITY>,
    overflowed: bool,
}

impl CommandParser {
    pub const fn new() -> Self {
        Self {
            line: heapless::Vec::new(),
            overflowed: false,
        }
    }

    /// Consume one byte. Returns an outcome when the byte ends a non-empty line.
    pub fn push_byte(&mut self, byte: u8) -> Option<CommandOutcome> {
        if byte == b'\n' || byte == b'\r' {
            return self.finish_line();
        }

        if self.overflowed {
            return None;
        }

        if self.line.push(byte).is_err() {
            trace!("Command line overflow, discarding until terminator");
            self.line.clear();
            self.overflowed = true;
        }
        None
    }

    /// Consume a received chunk, yielding one outcome per completed line
    pub fn feed<'a>(&'a mut self, bytes: &'a [u8]) -> impl Iterator<Item = CommandOutcome> + 'a {
        bytes.iter().filter_map(move |&byte| self.push_byte(byte))
    }

    /// Bytes of the line still waiting for a terminator
    pub fn pending(&self) -> &[u8] {
        &self.line
    }

    /// Drop any partial line
    pub fn reset(&mut self) {
        self.line.clear();
        self.overflowed = false;
    }

    fn finish_line(&mut self) -> Option<CommandOutcome> {
        if std::mem::take(&mut self.overflowed) {
            self.line.clear();
            debug!("Discarded over-long command line");
            return Some(CommandOutcome::Rejected(RateError::LineTooLong {
                capacity: LINE_CAPACITY,
            }));
        }

        if self.line.iter().all(u8::is_ascii_whitespace) {
            // Blank line, e.g. the `\n` of a `\r\n` pair
            self.line.clear();
            return None;
        }

        let outcome = match std::str::from_utf8(&self.line) {
            Ok(text) => text.parse::<SampleRate>(),
            Err(_) => Err(RateError::NotANumber),
        };
        self.line.clear();

        match outcome {
            Ok(rate) => {
                debug!("Parsed sample rate command: {}", rate);
                Some(CommandOutcome::Applied(rate))
            }
            Err(e) => {
                debug!("Rejected command: {}", e);
                Some(CommandOutcome::Rejected(e))
            }
        }
    }
}
