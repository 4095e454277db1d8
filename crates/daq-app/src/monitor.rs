//! Serial monitor front end

use crate::config::MonitorOutput;
use anyhow::{Context, Result};
use frame_codec::FrameSamples;
use serde::Serialize;
use std::future::Future;
use std::io::Write;
use std::time::{Duration, Instant};
use tokio::io::AsyncRead;
use tracing::{debug, info};
use usb_transport::{FrameReader, MonitorConfig, SerialMonitor, TransportError};

const SUMMARY_INTERVAL: Duration = Duration::from_secs(1);

/// Anything yielding decoded frames
pub(crate) trait FrameStream {
    async fn next_frame(&mut self) -> Result<Option<FrameSamples>, TransportError>;

    fn malformed(&self) -> u64;
}

impl FrameStream for SerialMonitor {
    async fn next_frame(&mut self) -> Result<Option<FrameSamples>, TransportError> {
        SerialMonitor::next_frame(self).await
    }

    fn malformed(&self) -> u64 {
        SerialMonitor::malformed(self)
    }
}

impl<R: AsyncRead + Unpin> FrameStream for FrameReader<R> {
    async fn next_frame(&mut self) -> Result<Option<FrameSamples>, TransportError> {
        FrameReader::next_frame(self).await
    }

    fn malformed(&self) -> u64 {
        FrameReader::malformed(self)
    }
}

/// Running statistics over every decoded sample
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamStats {
    pub frames: u64,
    pub samples: u64,
    pub min: Option<u16>,
    pub max: Option<u16>,
    #[serde(skip)]
    sum: u64,
}

impl StreamStats {
    pub fn record(&mut self, frame: &FrameSamples) {
        self.frames += 1;
        self.samples += frame.samples.len() as u64;
        self.sum += frame.samples.iter().map(|&s| u64::from(s)).sum::<u64>();
        self.min = match (self.min, frame.min()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max = match (self.max, frame.max()) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    pub fn mean(&self) -> Option<f64> {
        (self.samples > 0).then(|| self.sum as f64 / self.samples as f64)
    }
}

/// Outcome of a monitor session
#[derive(Debug, Clone, Serialize)]
pub struct MonitorReport {
    pub stats: StreamStats,
    pub mean: Option<f64>,
    pub malformed: u64,
}

/// Open the device and print its frames until `max_frames`, end of stream
/// or Ctrl-C
pub async fn run_monitor<W: Write>(
    config: &MonitorConfig,
    output: MonitorOutput,
    out: W,
) -> Result<MonitorReport> {
    let mut monitor = SerialMonitor::open(config)
        .await
        .with_context(|| format!("failed to open {}", config.device))?;

    consume(
        &mut monitor,
        config.max_frames,
        output,
        out,
        async {
            // Without a handler, wait forever
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        },
    )
    .await
}

pub(crate) async fn consume<S, W, F>(
    stream: &mut S,
    max_frames: Option<u64>,
    output: MonitorOutput,
    mut out: W,
    shutdown: F,
) -> Result<MonitorReport>
where
    S: FrameStream,
    W: Write,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut stats = StreamStats::default();
    let mut last_summary = Instant::now();

    while max_frames.map_or(true, |max| stats.frames < max) {
        let frame = tokio::select! {
            frame = stream.next_frame() => frame?,
            _ = &mut shutdown => {
                info!("Interrupted");
                break;
            }
        };
        let Some(frame) = frame else {
            info!("Device stream ended");
            break;
        };

        stats.record(&frame);
        debug!(
            "Frame {}: min {:?}, max {:?}, mean {:.1}",
            stats.frames,
            frame.min(),
            frame.max(),
            frame.mean().unwrap_or_default()
        );
        match output {
            MonitorOutput::Json => {
                serde_json::to_writer(&mut out, &frame)?;
                out.write_all(b"\n")?;
            }
            MonitorOutput::Summary => {
                if last_summary.elapsed() >= SUMMARY_INTERVAL {
                    info!(
                        "{} frames, min {:?}, max {:?}, mean {:.1}",
                        stats.frames,
                        stats.min,
                        stats.max,
                        stats.mean().unwrap_or_default()
                    );
                    last_summary = Instant::now();
                }
            }
        }
    }
    out.flush()?;

    Ok(MonitorReport {
        mean: stats.mean(),
        stats,
        malformed: stream.malformed(),
    })
}
