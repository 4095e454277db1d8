//! Transport capability

use crate::error::TransportError;
use crate::line_coding::LineCoding;
use std::collections::VecDeque;
use std::io::Write;
use std::sync::mpsc::{Receiver, TryRecvError};
use tracing::debug;

/// The outer serial-like channel.
///
/// Calls come from the USB event context and must not block: `send` queues
/// one packet on the IN endpoint, `receive` drains what the OUT endpoint
/// already holds and re-arms it.
pub trait Transport {
    /// Queue one outbound packet. An empty slice is a zero-length packet.
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Copy up to `buf.len()` received bytes into `buf`
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Apply a line coding requested by the host
    fn configure(&mut self, coding: LineCoding);
}

/// Host-side transport over any writer, with inbound bytes delivered on a
/// channel (e.g. from a thread reading stdin).
pub struct StreamTransport<W> {
    writer: W,
    inbound: Receiver<Vec<u8>>,
    pending: VecDeque<u8>,
    coding: LineCoding,
    closed: bool,
}

impl<W: Write> StreamTransport<W> {
    pub fn new(writer: W, inbound: Receiver<Vec<u8>>) -> Self {
        Self {
            writer,
            inbound,
            pending: VecDeque::new(),
            coding: LineCoding::default(),
            closed: false,
        }
    }

    pub fn line_coding(&self) -> LineCoding {
        self.coding
    }

    /// Whether the inbound side has hung up and everything was consumed
    pub fn is_closed(&self) -> bool {
        self.closed && self.pending.is_empty()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Transport for StreamTransport<W> {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.writer.write_all(bytes)?;
        self.writer.flush()?;
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        loop {
            match self.inbound.try_recv() {
                Ok(chunk) => self.pending.extend(chunk),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }

        let count = buf.len().min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }

    fn configure(&mut self, coding: LineCoding) {
        debug!("Line coding set to {:?}", coding);
        self.coding = coding;
    }
}
