//! Command Error Types

use thiserror::Error;

/// Reasons a command line is not applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RateError {
    /// Line is not a decimal integer
    #[error("Command is not a decimal number")]
    NotANumber,

    /// Rate outside the accepted band
    #[error("Sample rate {value} is out of range [{min}, {max}]")]
    OutOfRange { value: u32, min: u32, max: u32 },

    /// Line exceeded the line buffer and was discarded
    #[error("Command longer than {capacity} bytes")]
    LineTooLong { capacity: usize },
}
