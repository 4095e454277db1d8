//! In-memory transport for tests and dry runs

use crate::error::TransportError;
use crate::line_coding::LineCoding;
use crate::transport::Transport;
use std::collections::VecDeque;

/// Transport that records every packet sent and serves queued inbound bytes
#[derive(Debug, Default)]
pub struct MockTransport {
    sent: Vec<Vec<u8>>,
    inbound: VecDeque<u8>,
    coding: LineCoding,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes as if the host had sent them
    pub fn push_inbound(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes);
    }

    /// Every packet sent so far, zero-length ones included
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    pub fn line_coding(&self) -> LineCoding {
        self.coding
    }
}

impl Transport for MockTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.sent.push(bytes.to_vec());
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let count = buf.len().min(self.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(self.inbound.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }

    fn configure(&mut self, coding: LineCoding) {
        self.coding = coding;
    }
}
