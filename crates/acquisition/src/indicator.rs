//! Advisory status output

use command_parser::SampleRate;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Device-local status signal (an LED on the reference board).
///
/// Both execution contexts raise it, so methods take `&self`; a GPIO
/// set/reset register write is a single store.
pub trait StatusIndicator {
    /// A sample fell outside the expected operating band
    fn report_fault(&self);

    /// A rate command was accepted
    fn report_rate_change(&self, _rate: SampleRate) {}
}

impl<T: StatusIndicator + ?Sized> StatusIndicator for &T {
    fn report_fault(&self) {
        (**self).report_fault()
    }

    fn report_rate_change(&self, rate: SampleRate) {
        (**self).report_rate_change(rate)
    }
}

/// Indicator that only counts how often it was raised
#[derive(Debug, Default)]
pub struct CountingIndicator {
    faults: AtomicUsize,
    rate_changes: AtomicUsize,
}

impl CountingIndicator {
    pub const fn new() -> Self {
        Self {
            faults: AtomicUsize::new(0),
            rate_changes: AtomicUsize::new(0),
        }
    }

    pub fn faults(&self) -> usize {
        self.faults.load(Ordering::Relaxed)
    }

    pub fn rate_changes(&self) -> usize {
        self.rate_changes.load(Ordering::Relaxed)
    }
}

impl StatusIndicator for CountingIndicator {
    fn report_fault(&self) {
        self.faults.fetch_add(1, Ordering::Relaxed);
    }

    fn report_rate_change(&self, _rate: SampleRate) {
        self.rate_changes.fetch_add(1, Ordering::Relaxed);
    }
}
