//! Acquisition Interrupt Handler

use crate::indicator::StatusIndicator;
use crate::period::AcquisitionPeriod;
use crate::source::SampleSource;
use crate::timer::AcquisitionTimer;
use command_parser::SampleRate;
use frame_codec::FrameEncoder;
use ring_buffer::Producer;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Configuration for the acquisition handler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Lowest sample value considered healthy
    pub band_low: u16,
    /// Highest sample value considered healthy
    pub band_high: u16,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            band_low: 100,
            band_high: 4000,
        }
    }
}

impl AcquisitionConfig {
    /// Whether a sample lies outside the healthy band
    pub fn out_of_band(&self, sample: u16) -> bool {
        sample < self.band_low || sample > self.band_high
    }
}

/// Counters kept by the handler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HandlerStats {
    /// Timer updates serviced
    pub ticks: u64,
    /// Samples outside the healthy band
    pub faults: u64,
    /// Frames handed to the ring buffer
    pub frames: u64,
    /// Prescaler reloads performed
    pub reloads: u64,
}

/// Producer side of the stream, run from the highest-priority timer interrupt.
///
/// Owns the converter, the timer, the frame under construction and the write
/// half of the ring. Every call completes in bounded time without
/// allocating or blocking.
pub struct AcquisitionHandler<'a, S, T, I, const N: usize> {
    source: S,
    timer: T,
    indicator: I,
    encoder: FrameEncoder,
    producer: Producer<'a, N>,
    period: &'a AcquisitionPeriod,
    programmed: SampleRate,
    config: AcquisitionConfig,
    stats: HandlerStats,
}

impl<'a, S, T, I, const N: usize> AcquisitionHandler<'a, S, T, I, N>
where
    S: SampleSource,
    T: AcquisitionTimer,
    I: StatusIndicator,
{
    /// Create a handler and program the timer for the current rate
    pub fn new(
        source: S,
        mut timer: T,
        indicator: I,
        producer: Producer<'a, N>,
        period: &'a AcquisitionPeriod,
        config: AcquisitionConfig,
    ) -> Self {
        let programmed = period.load();
        timer.set_prescaler(programmed.prescaler());
        debug!(
            "Acquisition handler ready at {} (prescaler {})",
            programmed,
            programmed.prescaler()
        );

        Self {
            source,
            timer,
            indicator,
            encoder: FrameEncoder::new(),
            producer,
            period,
            programmed,
            config,
            stats: HandlerStats::default(),
        }
    }

    /// Service one timer interrupt. Returns `false` if no update was pending.
    pub fn on_timer_expiry(&mut self) -> bool {
        if !self.timer.update_pending() {
            return false;
        }

        self.reload_period();

        let sample = self.source.read_and_rearm();
        if self.config.out_of_band(sample) {
            self.stats.faults += 1;
            self.indicator.report_fault();
        }

        if let Some(frame) = self.encoder.push_sample(sample) {
            self.producer.write(&frame);
            self.stats.frames += 1;
            trace!("Sealed frame {}", self.stats.frames);
        }

        self.stats.ticks += 1;
        self.timer.clear_update();
        true
    }

    /// Reprogram the timer if the shared rate changed since the last tick
    fn reload_period(&mut self) {
        let rate = self.period.load();
        if rate != self.programmed {
            self.timer.set_prescaler(rate.prescaler());
            self.programmed = rate;
            self.stats.reloads += 1;
            trace!("Timer reloaded for {}", rate);
        }
    }

    /// Rate the timer is currently programmed for
    pub fn programmed_rate(&self) -> SampleRate {
        self.programmed
    }

    pub fn stats(&self) -> HandlerStats {
        self.stats
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::CountingIndicator;
    use crate::timer::SoftTimer;
    use frame_codec::{decode_frame, FRAME_CAPACITY, SAMPLES_PER_FRAME};
    use ring_buffer::FrameRing;

    fn counter_source(start: u16) -> impl FnMut() -> u16 {
        let mut next = start;
        move || {
            let value = next;
            next = (next + 1) & 0x0FFF;
            value
        }
    }

    fn tick<S, I, const N: usize>(handler: &mut AcquisitionHandler<'_, S, SoftTimer, I, N>)
    where
        S: SampleSource,
        I: StatusIndicator,
    {
        handler.timer_mut().fire();
        assert!(handler.on_timer_expiry());
    }

    #[test]
    fn test_no_work_without_update() {
        let mut ring = FrameRing::<4>::new();
        let period = AcquisitionPeriod::default();
        let indicator = CountingIndicator::new();
        let (producer, _consumer) = ring.split();
        let mut handler = AcquisitionHandler::new(
            counter_source(500),
            SoftTimer::new(0),
            &indicator,
            producer,
            &period,
            AcquisitionConfig::default(),
        );

        assert!(!handler.on_timer_expiry());
        assert_eq!(handler.stats().ticks, 0);
    }

    #[test]
    fn test_programs_initial_prescaler() {
        let mut ring = FrameRing::<4>::new();
        let period = AcquisitionPeriod::new(SampleRate::new(24000).unwrap());
        let indicator = CountingIndicator::new();
        let (producer, _consumer) = ring.split();
        let handler = AcquisitionHandler::new(
            counter_source(500),
            SoftTimer::new(0),
            &indicator,
            producer,
            &period,
            AcquisitionConfig::default(),
        );
        assert_eq!(handler.timer().prescaler(), 999);
    }

    #[test]
    fn test_frame_per_samples_batch() {
        let mut ring = FrameRing::<4>::new();
        let period = AcquisitionPeriod::default();
        let indicator = CountingIndicator::new();
        let (producer, mut consumer) = ring.split();
        let mut handler = AcquisitionHandler::new(
            counter_source(1000),
            SoftTimer::new(0),
            &indicator,
            producer,
            &period,
            AcquisitionConfig::default(),
        );

        for _ in 0..SAMPLES_PER_FRAME - 1 {
            tick(&mut handler);
        }
        assert!(consumer.read().is_none());

        tick(&mut handler);
        let frame = consumer.read().expect("sealed frame");
        assert_eq!(frame.len(), FRAME_CAPACITY);

        let decoded = decode_frame(frame.as_bytes()).unwrap();
        let expected: Vec<u16> = (1000..1000 + SAMPLES_PER_FRAME as u16).collect();
        assert_eq!(decoded.samples, expected);
        assert!(!handler.timer().update_pending());
        assert_eq!(handler.stats().frames, 1);
    }

    #[test]
    fn test_out_of_band_reports_fault() {
        let mut ring = FrameRing::<4>::new();
        let period = AcquisitionPeriod::default();
        let indicator = CountingIndicator::new();
        let (producer, _consumer) = ring.split();
        let samples = [50u16, 100, 2000, 4000, 4001, 4095];
        let mut iter = samples.into_iter().cycle();
        let mut handler = AcquisitionHandler::new(
            move || iter.next().unwrap_or(0),
            SoftTimer::new(0),
            &indicator,
            producer,
            &period,
            AcquisitionConfig::default(),
        );

        for _ in 0..samples.len() {
            tick(&mut handler);
        }
        assert_eq!(indicator.faults(), 3);
        assert_eq!(handler.stats().faults, 3);
        assert_eq!(handler.stats().ticks, samples.len() as u64);
    }

    #[test]
    fn test_reloads_on_rate_change() {
        let mut ring = FrameRing::<4>::new();
        let period = AcquisitionPeriod::default();
        let indicator = CountingIndicator::new();
        let (producer, _consumer) = ring.split();
        let mut handler = AcquisitionHandler::new(
            counter_source(1000),
            SoftTimer::new(0),
            &indicator,
            producer,
            &period,
            AcquisitionConfig::default(),
        );
        assert_eq!(handler.timer().prescaler(), 499);

        tick(&mut handler);
        assert_eq!(handler.stats().reloads, 0);

        period.store(SampleRate::new(24000).unwrap());
        tick(&mut handler);
        assert_eq!(handler.timer().prescaler(), 999);
        assert_eq!(handler.programmed_rate().hz(), 24000);

        tick(&mut handler);
        assert_eq!(handler.stats().reloads, 1);
    }

    #[test]
    fn test_band_edges() {
        let config = AcquisitionConfig::default();
        assert!(config.out_of_band(99));
        assert!(!config.out_of_band(100));
        assert!(!config.out_of_band(4000));
        assert!(config.out_of_band(4001));
    }
}
