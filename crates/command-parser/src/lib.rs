//! Sample-Rate Command Parsing
//!
//! Turns inbound serial bytes into validated sample-rate changes. A command is
//! a decimal number of samples per second terminated by `\n` or `\r`.

mod error;
mod parser;
mod rate;

pub use error::RateError;
pub use parser::{CommandOutcome, CommandParser, LINE_CAPACITY};
pub use rate::{SampleRate, TIMER_CLOCK_HZ};
