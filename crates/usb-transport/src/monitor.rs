//! Host-side serial monitor
//!
//! Opens the device's serial port, optionally sends a rate command, and
//! decodes the `\n`-terminated frame stream.

use crate::error::TransportError;
use crate::line_coding::LineCoding;
use command_parser::SampleRate;
use frame_codec::{decode_frame, FrameSamples, FRAME_CAPACITY};
use serde::{Deserialize, Serialize};
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf,
    WriteHalf,
};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn};

/// Longest line buffered before it is dropped as noise
const MAX_LINE_LEN: u64 = FRAME_CAPACITY as u64 * 4;

/// Monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Serial device path (e.g. "/dev/ttyACM0" or "COM3")
    pub device: String,
    /// Line coding to open the port with
    pub line_coding: LineCoding,
    /// Rate command sent right after opening
    pub initial_rate: Option<SampleRate>,
    /// Stop after this many frames
    pub max_frames: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyACM0".to_string(),
            line_coding: LineCoding::default(),
            initial_rate: None,
            max_frames: None,
        }
    }
}

/// Splits a byte stream into frames and decodes them.
///
/// Blank lines (the device's idle packets on some hosts) are skipped, and so
/// is anything that does not decode, such as a partial frame at connect time.
pub struct FrameReader<R> {
    reader: BufReader<R>,
    line: Vec<u8>,
    malformed: u64,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line: Vec::with_capacity(FRAME_CAPACITY),
            malformed: 0,
        }
    }

    /// Next decodable frame, or `None` at end of stream
    pub async fn next_frame(&mut self) -> Result<Option<FrameSamples>, TransportError> {
        loop {
            self.line.clear();
            let read = self.read_bounded_line().await?;
            if read == 0 {
                return Ok(None);
            }
            if !self.line.ends_with(b"\n") && read as u64 == MAX_LINE_LEN {
                self.malformed += 1;
                warn!("Skipping unterminated line longer than {} bytes", MAX_LINE_LEN);
                self.skip_rest_of_line().await?;
                continue;
            }
            if self.line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            match decode_frame(&self.line) {
                Ok(samples) => return Ok(Some(samples)),
                Err(e) => {
                    self.malformed += 1;
                    warn!("Skipping malformed frame ({} bytes): {}", self.line.len(), e);
                }
            }
        }
    }

    /// Append at most `MAX_LINE_LEN` bytes, stopping after a terminator
    async fn read_bounded_line(&mut self) -> Result<usize, TransportError> {
        let read = (&mut self.reader)
            .take(MAX_LINE_LEN)
            .read_until(b'\n', &mut self.line)
            .await?;
        Ok(read)
    }

    /// Discard input through the next terminator or end of stream
    async fn skip_rest_of_line(&mut self) -> Result<(), TransportError> {
        loop {
            self.line.clear();
            let read = self.read_bounded_line().await?;
            if read == 0 || self.line.ends_with(b"\n") {
                self.line.clear();
                return Ok(());
            }
        }
    }

    /// Lines that failed to decode
    pub fn malformed(&self) -> u64 {
        self.malformed
    }
}

/// Write a rate command line
async fn write_rate<W: AsyncWrite + Unpin>(writer: &mut W, rate: SampleRate) -> Result<(), TransportError> {
    let command = format!("{}\n", rate.hz());
    writer.write_all(command.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Open serial link to the device
pub struct SerialMonitor {
    frames: FrameReader<ReadHalf<SerialStream>>,
    writer: WriteHalf<SerialStream>,
}

impl SerialMonitor {
    /// Open the configured port and send the initial rate, if any
    pub async fn open(config: &MonitorConfig) -> Result<Self, TransportError> {
        info!("Opening serial monitor on {}", config.device);

        let stream = config
            .line_coding
            .port_builder(&config.device)?
            .open_native_async()?;
        let (reader, writer) = tokio::io::split(stream);

        let mut monitor = Self {
            frames: FrameReader::new(reader),
            writer,
        };

        if let Some(rate) = config.initial_rate {
            monitor.send_rate(rate).await?;
        }

        Ok(monitor)
    }

    /// Ask the device to sample at `rate`
    pub async fn send_rate(&mut self, rate: SampleRate) -> Result<(), TransportError> {
        debug!("Requesting sample rate {}", rate);
        write_rate(&mut self.writer, rate).await
    }

    pub async fn next_frame(&mut self) -> Result<Option<FrameSamples>, TransportError> {
        self.frames.next_frame().await
    }

    pub fn malformed(&self) -> u64 {
        self.frames.malformed()
    }
}
