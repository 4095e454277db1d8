//! Codec Error Types

use thiserror::Error;

/// Errors raised while building or decoding frames
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// More bytes than a frame can hold
    #[error("Frame of {len} bytes exceeds capacity {capacity}")]
    TooLong { len: usize, capacity: usize },

    /// Frame length differs from the sealed length
    #[error("Frame length {actual} does not match expected {expected}")]
    BadLength { expected: usize, actual: usize },

    /// Last byte is not the terminator
    #[error("Frame is not terminated")]
    MissingTerminator,

    /// Byte outside the 64-symbol alphabet
    #[error("Invalid symbol 0x{symbol:02X} at offset {offset}")]
    InvalidSymbol { offset: usize, symbol: u8 },
}
