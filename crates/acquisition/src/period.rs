//! Sampling rate shared between the command and acquisition contexts

use command_parser::SampleRate;
use std::sync::atomic::{AtomicU32, Ordering};

/// Current sampling rate, written by the command path and read by the
/// acquisition reload path. A single 32-bit atomic, so readers only ever see
/// a complete old or new value.
#[derive(Debug)]
pub struct AcquisitionPeriod {
    hz: AtomicU32,
}

impl AcquisitionPeriod {
    pub const fn new(rate: SampleRate) -> Self {
        Self {
            hz: AtomicU32::new(rate.hz()),
        }
    }

    /// Current rate
    pub fn load(&self) -> SampleRate {
        // Only validated rates are ever stored
        SampleRate::new(self.hz.load(Ordering::Acquire)).unwrap_or_default()
    }

    /// Publish a new rate
    pub fn store(&self, rate: SampleRate) {
        self.hz.store(rate.hz(), Ordering::Release);
    }

    /// Publish a new rate, returning the previous one
    pub fn replace(&self, rate: SampleRate) -> SampleRate {
        let previous = self.hz.swap(rate.hz(), Ordering::AcqRel);
        SampleRate::new(previous).unwrap_or_default()
    }
}

impl Default for AcquisitionPeriod {
    fn default() -> Self {
        Self::new(SampleRate::DEFAULT)
    }
}
