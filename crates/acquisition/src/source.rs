//! Analog sample sources

use frame_codec::SAMPLE_MASK;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use thiserror::Error;

/// A converter that always has one conversion in flight.
///
/// `read_and_rearm` returns the value of the previous conversion and starts
/// the next one. It never fails: if a conversion has not finished, whatever
/// the data register holds is returned.
pub trait SampleSource {
    fn read_and_rearm(&mut self) -> u16;
}

impl<F: FnMut() -> u16> SampleSource for F {
    fn read_and_rearm(&mut self) -> u16 {
        self()
    }
}

/// Invalid synthetic source parameters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceConfigError {
    #[error("Sine period must be at least 2 samples, got {0}")]
    PeriodTooShort(u32),

    #[error("Offset {offset} +/- amplitude {amplitude} leaves the 12-bit range")]
    OutOfScale { offset: u16, amplitude: u16 },
}

/// Parameters of the synthetic sine source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SineSourceConfig {
    /// Samples per sine cycle
    pub period_samples: u32,
    /// Peak deviation from the offset, in counts
    pub amplitude: u16,
    /// Mid-scale value, in counts
    pub offset: u16,
}

impl Default for SineSourceConfig {
    fn default() -> Self {
        Self {
            period_samples: 48,
            amplitude: 1800,
            offset: 2048,
        }
    }
}

/// Synthetic 12-bit converter producing a sine wave
#[derive(Debug, Clone)]
pub struct SineSource {
    config: SineSourceConfig,
    position: u32,
    latched: u16,
}

impl SineSource {
    pub fn new(config: SineSourceConfig) -> Result<Self, SourceConfigError> {
        if config.period_samples < 2 {
            return Err(SourceConfigError::PeriodTooShort(config.period_samples));
        }
        let low = config.offset.checked_sub(config.amplitude);
        let high = config.offset.checked_add(config.amplitude);
        match (low, high) {
            (Some(_), Some(high)) if high <= SAMPLE_MASK => {}
            _ => {
                return Err(SourceConfigError::OutOfScale {
                    offset: config.offset,
                    amplitude: config.amplitude,
                })
            }
        }

        // First read returns the offset, as a converter powered at mid-scale
        let latched = config.offset;
        Ok(Self {
            config,
            position: 0,
            latched,
        })
    }

    fn convert(&mut self) -> u16 {
        let phase = TAU * f64::from(self.position) / f64::from(self.config.period_samples);
        self.position = (self.position + 1) % self.config.period_samples;
        let value = f64::from(self.config.offset) + f64::from(self.config.amplitude) * phase.sin();
        value.round().clamp(0.0, f64::from(SAMPLE_MASK)) as u16
    }
}

impl SampleSource for SineSource {
    fn read_and_rearm(&mut self) -> u16 {
        let value = self.latched;
        self.latched = self.convert();
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_config() {
        let short = SineSourceConfig {
            period_samples: 1,
            ..Default::default()
        };
        assert_eq!(
            SineSource::new(short).unwrap_err(),
            SourceConfigError::PeriodTooShort(1)
        );

        let clipped = SineSourceConfig {
            amplitude: 3000,
            ..Default::default()
        };
        assert!(matches!(
            SineSource::new(clipped),
            Err(SourceConfigError::OutOfScale { .. })
        ));
    }

    #[test]
    fn test_one_conversion_ahead() {
        let mut source = SineSource::new(SineSourceConfig {
            period_samples: 4,
            amplitude: 1000,
            offset: 2000,
        })
        .unwrap();

        // Power-on latch, then sin(0), sin(pi/2), sin(pi), sin(3pi/2)
        let values: Vec<u16> = (0..6).map(|_| source.read_and_rearm()).collect();
        assert_eq!(values, vec![2000, 2000, 3000, 2000, 1000, 2000]);
    }

    #[test]
    fn test_stays_in_twelve_bits() {
        let mut source = SineSource::new(SineSourceConfig {
            period_samples: 97,
            amplitude: 2047,
            offset: 2048,
        })
        .unwrap();
        for _ in 0..1000 {
            assert!(source.read_and_rearm() <= SAMPLE_MASK);
        }
    }

    #[test]
    fn test_closure_source() {
        let mut next = 0u16;
        let mut source = move || {
            next += 1;
            next
        };
        assert_eq!(source.read_and_rearm(), 1);
        assert_eq!(source.read_and_rearm(), 2);
    }
}
