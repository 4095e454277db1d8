//! Host-side device simulation
//!
//! Runs the acquisition handler on a paced thread and the transport side on
//! the calling thread, joined only by the frame ring and the shared period.

use crate::config::SimulationConfig;
use acquisition::{
    AcquisitionHandler, AcquisitionPeriod, CountingIndicator, HandlerStats, SineSource, SoftTimer,
    StatusIndicator,
};
use anyhow::{anyhow, Context, Result};
use ring_buffer::{FrameRing, RingStats, DEFAULT_CAPACITY};
use serde::Serialize;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};
use usb_transport::{
    CommandReceiver, StreamTransport, TransportConsumer, TransportError, TxOutcome, MAX_PACKET_SIZE,
};

/// Producer wake-up interval
const PRODUCER_TICK: Duration = Duration::from_millis(1);

/// Most timer updates serviced per wake-up; a stalled thread does not
/// replay the whole stall
const MAX_BURST_SECS: f64 = 0.05;

/// Summary of a simulation run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub elapsed_secs: f64,
    pub final_rate: u32,
    pub frames_sent: u64,
    pub idle_polls: u64,
    pub commands_applied: u64,
    pub commands_rejected: u64,
    pub indicator_faults: usize,
    pub acquisition: HandlerStats,
    pub ring: RingStats,
}

/// Read stdin on a detached thread, one packet-sized chunk per message.
/// The channel disconnects at end of input.
pub fn spawn_stdin_reader() -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut stdin = std::io::stdin().lock();
        let mut buf = [0u8; MAX_PACKET_SIZE];
        loop {
            match stdin.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("stdin read failed: {}", e);
                    break;
                }
            }
        }
        debug!("stdin closed");
    });
    rx
}

/// Run the simulated device until the duration elapses or, without a
/// duration, until `inbound` disconnects.
pub fn run_simulation<W: Write>(
    config: &SimulationConfig,
    writer: W,
    inbound: Receiver<Vec<u8>>,
) -> Result<SimulationReport> {
    let source = SineSource::new(config.source.clone()).context("invalid sine source")?;
    let deadline = config
        .duration_secs
        .map(Duration::try_from_secs_f64)
        .transpose()
        .context("invalid simulate.duration_secs")?;
    let period = AcquisitionPeriod::new(config.initial_rate);
    let indicator = CountingIndicator::new();
    let stop = AtomicBool::new(false);
    let mut ring = FrameRing::<DEFAULT_CAPACITY>::new();
    let (producer, consumer) = ring.split();

    let poll = Duration::from_micros(config.tx_poll_us.max(1));
    let stats_every = Duration::from_millis(config.stats_interval_ms.max(1));

    info!(
        "Simulating device at {} (prescaler {})",
        config.initial_rate,
        config.initial_rate.prescaler()
    );

    let started = Instant::now();

    thread::scope(|scope| -> Result<SimulationReport> {
        let acquisition = scope.spawn(|| {
            let mut handler = AcquisitionHandler::new(
                source,
                SoftTimer::new(0),
                &indicator,
                producer,
                &period,
                config.acquisition.clone(),
            );
            let mut last = Instant::now();
            let mut owed = 0.0f64;

            while !stop.load(Ordering::Acquire) {
                thread::sleep(PRODUCER_TICK);
                let now = Instant::now();
                let rate = f64::from(handler.programmed_rate().effective_hz());
                owed += now.duration_since(last).as_secs_f64() * rate;
                owed = owed.min(rate * MAX_BURST_SECS);
                last = now;

                while owed >= 1.0 {
                    handler.timer_mut().fire();
                    handler.on_timer_expiry();
                    owed -= 1.0;
                }
            }
            handler.stats()
        });

        let mut transport = StreamTransport::new(writer, inbound);
        let mut tx = TransportConsumer::new(consumer);
        let mut rx = CommandReceiver::new(&period, &indicator);
        let mut last_stats = Instant::now();
        let mut reported_faults = 0;
        let mut reported_dropped = 0;

        let result = loop {
            if let Err(e) = service_events(&mut transport, &mut tx, &mut rx) {
                break Err(e);
            }

            let elapsed = started.elapsed();
            match deadline {
                Some(limit) if elapsed >= limit => break Ok(()),
                None if transport.is_closed() => break Ok(()),
                _ => {}
            }

            if last_stats.elapsed() >= stats_every {
                let ring = tx.ring().stats();
                let faults = indicator.faults();
                let new_faults = faults - reported_faults;
                metrics::counter!("sample_faults_total").increment(new_faults as u64);
                metrics::gauge!("ring_occupancy").set(ring.len as f64);

                if ring.dropped > reported_dropped {
                    warn!("Consumer fell behind, {} frames dropped", ring.dropped - reported_dropped);
                }
                if new_faults > 0 {
                    warn!("{} samples out of band", new_faults);
                }
                info!(
                    "Sent {} frames, dropped {}, rate {}",
                    tx.frames_sent(),
                    ring.dropped,
                    period.load()
                );

                reported_faults = faults;
                reported_dropped = ring.dropped;
                last_stats = Instant::now();
            }

            thread::sleep(poll);
        };

        stop.store(true, Ordering::Release);
        let acquisition = acquisition
            .join()
            .map_err(|_| anyhow!("acquisition thread panicked"))?;

        match result {
            Ok(()) => {}
            Err(TransportError::Io(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                info!("Output closed, stopping");
            }
            Err(e) => return Err(e).context("transport failed"),
        }

        // Flush whatever the last producer wake-up sealed
        while let Ok(TxOutcome::Frame { .. }) = tx.on_tx_ready(&mut transport) {}

        Ok(SimulationReport {
            elapsed_secs: started.elapsed().as_secs_f64(),
            final_rate: period.load().hz(),
            frames_sent: tx.frames_sent(),
            idle_polls: tx.idle_polls(),
            commands_applied: rx.applied(),
            commands_rejected: rx.rejected(),
            indicator_faults: indicator.faults(),
            acquisition,
            ring: tx.ring().stats(),
        })
    })
}

/// Drain pending commands, then every ready frame
fn service_events<W: Write, I: StatusIndicator, const N: usize>(
    transport: &mut StreamTransport<W>,
    tx: &mut TransportConsumer<'_, N>,
    rx: &mut CommandReceiver<'_, I>,
) -> Result<(), TransportError> {
    loop {
        let summary = rx.on_rx_ready(transport)?;
        if summary.bytes == 0 {
            break;
        }
        metrics::counter!("commands_applied_total").increment(u64::from(summary.applied.is_some()));
        metrics::counter!("commands_rejected_total").increment(summary.rejected as u64);
    }

    let dropped_before = tx.ring().dropped();
    loop {
        match tx.on_tx_ready(transport)? {
            TxOutcome::Frame { .. } => metrics::counter!("frames_sent_total").increment(1),
            TxOutcome::Idle => {
                metrics::counter!("idle_polls_total").increment(1);
                break;
            }
        }
    }
    let dropped = tx.ring().dropped().saturating_sub(dropped_before);
    if dropped > 0 {
        metrics::counter!("frames_dropped_total").increment(dropped as u64);
        trace!("Ring overran, {} frames dropped", dropped);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_codec::{decode_frame, FRAME_CAPACITY, SAMPLES_PER_FRAME};

    fn short_run(duration: f64) -> SimulationConfig {
        SimulationConfig {
            duration_secs: Some(duration),
            tx_poll_us: 200,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_emits_decodable_frames() {
        let (_tx, rx) = mpsc::channel();
        let mut out = Vec::new();
        let report = run_simulation(&short_run(0.1), &mut out, rx).unwrap();

        assert!(report.frames_sent > 0);
        assert_eq!(out.len() as u64, report.frames_sent * FRAME_CAPACITY as u64);
        for line in out.chunks(FRAME_CAPACITY) {
            let samples = decode_frame(line).unwrap();
            assert_eq!(samples.samples.len(), SAMPLES_PER_FRAME);
        }
        assert_eq!(report.final_rate, 48_000);
        assert_eq!(report.commands_applied, 0);
    }

    #[test]
    fn test_applies_rate_command() {
        let (tx, rx) = mpsc::channel();
        tx.send(b"24000\n".to_vec()).unwrap();
        tx.send(b"999999\nabc\n".to_vec()).unwrap();

        let report = run_simulation(&short_run(0.1), Vec::new(), rx).unwrap();
        assert_eq!(report.final_rate, 24_000);
        assert_eq!(report.commands_applied, 1);
        assert_eq!(report.commands_rejected, 2);
    }

    #[test]
    fn test_stops_when_input_closes() {
        let (tx, rx) = mpsc::channel();
        tx.send(b"8000\n".to_vec()).unwrap();
        drop(tx);

        let config = SimulationConfig {
            duration_secs: None,
            ..SimulationConfig::default()
        };
        let report = run_simulation(&config, Vec::new(), rx).unwrap();
        assert_eq!(report.final_rate, 8_000);
        assert!(report.elapsed_secs < 5.0);
    }

    #[test]
    fn test_rejects_bad_duration() {
        for duration in [-1.0, f64::NAN, f64::INFINITY] {
            let (_tx, rx) = mpsc::channel();
            let result = run_simulation(&short_run(duration), Vec::new(), rx);
            assert!(result.is_err(), "duration {duration} accepted");
        }
    }

    #[test]
    fn test_rejects_bad_source() {
        let mut config = short_run(0.01);
        config.source.period_samples = 0;
        let (_tx, rx) = mpsc::channel();
        assert!(run_simulation(&config, Vec::new(), rx).is_err());
    }
}
