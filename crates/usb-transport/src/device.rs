//! Device-side endpoint event handlers
//!
//! These run in the USB interrupt, below the acquisition interrupt in
//! priority. None of them block or allocate.

use crate::error::TransportError;
use crate::line_coding::LineCoding;
use crate::transport::Transport;
use crate::MAX_PACKET_SIZE;
use acquisition::{AcquisitionPeriod, StatusIndicator};
use command_parser::{CommandOutcome, CommandParser, SampleRate};
use ring_buffer::{Consumer, FrameRing};
use tracing::{debug, info, trace};

/// What the consumer sent on a transmit-ready event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOutcome {
    /// A frame of `len` bytes
    Frame { len: usize },
    /// Nothing was ready; a zero-length packet keeps the endpoint moving
    Idle,
}

/// Transport Consumer: drains one frame per IN-endpoint completion.
pub struct TransportConsumer<'a, const N: usize> {
    consumer: Consumer<'a, N>,
    frames_sent: u64,
    idle_polls: u64,
}

impl<'a, const N: usize> TransportConsumer<'a, N> {
    pub fn new(consumer: Consumer<'a, N>) -> Self {
        Self {
            consumer,
            frames_sent: 0,
            idle_polls: 0,
        }
    }

    /// Handle a transmit-ready event
    pub fn on_tx_ready<T: Transport>(&mut self, transport: &mut T) -> Result<TxOutcome, TransportError> {
        match self.consumer.read() {
            Some(frame) => {
                transport.send(frame.as_bytes())?;
                self.frames_sent += 1;
                trace!("Sent frame of {} bytes", frame.len());
                Ok(TxOutcome::Frame { len: frame.len() })
            }
            None => {
                transport.send(&[])?;
                self.idle_polls += 1;
                Ok(TxOutcome::Idle)
            }
        }
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    pub fn idle_polls(&self) -> u64 {
        self.idle_polls
    }

    pub fn ring(&self) -> &FrameRing<N> {
        self.consumer.ring()
    }
}

/// Result of one receive event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RxSummary {
    /// Bytes pulled from the endpoint
    pub bytes: usize,
    /// Last rate applied from this chunk, if any
    pub applied: Option<SampleRate>,
    /// Lines discarded in this chunk
    pub rejected: usize,
}

/// Command path: feeds OUT-endpoint data to the parser and publishes
/// accepted rates to the acquisition context.
pub struct CommandReceiver<'a, I> {
    parser: CommandParser,
    period: &'a AcquisitionPeriod,
    indicator: I,
    applied: u64,
    rejected: u64,
}

impl<'a, I: StatusIndicator> CommandReceiver<'a, I> {
    pub fn new(period: &'a AcquisitionPeriod, indicator: I) -> Self {
        Self {
            parser: CommandParser::new(),
            period,
            indicator,
            applied: 0,
            rejected: 0,
        }
    }

    /// Handle a data-received event: pull one packet and process it
    pub fn on_rx_ready<T: Transport>(&mut self, transport: &mut T) -> Result<RxSummary, TransportError> {
        let mut chunk = [0u8; MAX_PACKET_SIZE];
        let len = transport.receive(&mut chunk)?;
        Ok(self.on_data(&chunk[..len]))
    }

    /// Process received bytes
    pub fn on_data(&mut self, chunk: &[u8]) -> RxSummary {
        let mut summary = RxSummary {
            bytes: chunk.len(),
            ..Default::default()
        };

        for outcome in self.parser.feed(chunk) {
            match outcome {
                CommandOutcome::Applied(rate) => {
                    let previous = self.period.replace(rate);
                    self.indicator.report_rate_change(rate);
                    self.applied += 1;
                    summary.applied = Some(rate);
                    info!("Sample rate changed from {} to {}", previous, rate);
                }
                CommandOutcome::Rejected(e) => {
                    self.rejected += 1;
                    summary.rejected += 1;
                    debug!("Ignoring command: {}", e);
                }
            }
        }

        summary
    }

    /// Bytes of an unterminated command
    pub fn pending(&self) -> &[u8] {
        self.parser.pending()
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}

/// Class-specific control requests the device answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest<'a> {
    SetLineCoding(&'a [u8]),
    GetLineCoding,
    SetControlLineState { dtr: bool, rts: bool },
}

/// Reply to a control request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlResponse {
    Ack,
    Data([u8; LineCoding::WIRE_LEN]),
    Stall,
}

/// Stores the host's line coding and hands it back unmodified.
///
/// The payload is kept as sent; it is only decoded to pass a recognised
/// coding on to the transport.
#[derive(Debug)]
pub struct LineCodingControl {
    coding: [u8; LineCoding::WIRE_LEN],
    dtr: bool,
}

impl Default for LineCodingControl {
    fn default() -> Self {
        Self {
            coding: LineCoding::default().to_bytes(),
            dtr: false,
        }
    }
}

impl LineCodingControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle<T: Transport>(&mut self, request: ControlRequest<'_>, transport: &mut T) -> ControlResponse {
        match request {
            ControlRequest::SetLineCoding(payload) => {
                let Ok(coding) = <[u8; LineCoding::WIRE_LEN]>::try_from(payload) else {
                    debug!("Stalling SET_LINE_CODING of {} bytes", payload.len());
                    return ControlResponse::Stall;
                };
                self.coding = coding;
                match LineCoding::from_bytes(&coding) {
                    Ok(decoded) => transport.configure(decoded),
                    Err(e) => debug!("Stored line coding without applying it: {}", e),
                }
                ControlResponse::Ack
            }
            ControlRequest::GetLineCoding => ControlResponse::Data(self.coding),
            ControlRequest::SetControlLineState { dtr, rts } => {
                trace!("Control line state dtr={} rts={}", dtr, rts);
                self.dtr = dtr;
                ControlResponse::Ack
            }
        }
    }

    /// Line coding exactly as the host last set it
    pub fn raw_line_coding(&self) -> [u8; LineCoding::WIRE_LEN] {
        self.coding
    }

    /// Decoded line coding, if the stored bytes are a known one
    pub fn line_coding(&self) -> Result<LineCoding, TransportError> {
        LineCoding::from_bytes(&self.coding)
    }

    /// Whether the host has a terminal open
    pub fn dtr(&self) -> bool {
        self.dtr
    }
}
