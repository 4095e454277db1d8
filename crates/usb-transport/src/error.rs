//! Transport Error Types

use thiserror::Error;

/// Errors that can occur on the serial transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// Serial port could not be opened or configured
    #[error("Serial port error: {0}")]
    Serial(String),

    /// I/O failure while reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed line coding payload
    #[error("Invalid line coding: {0}")]
    InvalidLineCoding(String),

    /// Peer went away
    #[error("Transport closed")]
    Closed,
}

impl From<tokio_serial::Error> for TransportError {
    fn from(err: tokio_serial::Error) -> Self {
        TransportError::Serial(err.to_string())
    }
}
