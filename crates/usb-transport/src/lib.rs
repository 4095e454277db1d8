//! Serial Transport Glue
//!
//! Connects the frame ring and the command parser to a CDC-ACM style
//! transport. The device side reacts to endpoint events without blocking;
//! the host side opens a serial port and decodes the frame stream.

mod device;
mod error;
mod line_coding;
mod mock;
mod monitor;
mod transport;

pub use device::{
    CommandReceiver, ControlRequest, ControlResponse, LineCodingControl, RxSummary,
    TransportConsumer, TxOutcome,
};
pub use error::TransportError;
pub use line_coding::{LineCoding, Parity, StopBits};
pub use mock::MockTransport;
pub use monitor::{FrameReader, MonitorConfig, SerialMonitor};
pub use transport::{StreamTransport, Transport};

/// Bulk endpoint packet size; also the largest inbound chunk
pub const MAX_PACKET_SIZE: usize = 64;
