//! Validated sample rate and derived timer settings

use crate::error::RateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Input clock of the acquisition timer
pub const TIMER_CLOCK_HZ: u32 = 48_000_000;

/// Timer counts per update event (auto-reload of 1)
const COUNTS_PER_UPDATE: u32 = 2;

/// Sampling rate in samples per second, always within
/// [`SampleRate::MIN`]..=[`SampleRate::MAX`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SampleRate(u32);

impl SampleRate {
    pub const MIN: SampleRate = SampleRate(1_000);
    pub const MAX: SampleRate = SampleRate(48_000);
    /// Rate in effect after reset
    pub const DEFAULT: SampleRate = Self::MAX;

    /// Validate a rate in samples per second
    pub fn new(hz: u32) -> Result<Self, RateError> {
        if (Self::MIN.0..=Self::MAX.0).contains(&hz) {
            Ok(Self(hz))
        } else {
            Err(RateError::OutOfRange {
                value: hz,
                min: Self::MIN.0,
                max: Self::MAX.0,
            })
        }
    }

    pub const fn hz(self) -> u32 {
        self.0
    }

    /// Timer prescaler that yields this rate: `clock / (2 * rate) - 1`.
    pub const fn prescaler(self) -> u16 {
        // MIN gives 23_999, so the result always fits
        (TIMER_CLOCK_HZ / (COUNTS_PER_UPDATE * self.0) - 1) as u16
    }

    /// Rate the timer actually produces for this prescaler
    pub const fn effective_hz(self) -> u32 {
        TIMER_CLOCK_HZ / (COUNTS_PER_UPDATE * (self.prescaler() as u32 + 1))
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for SampleRate {
    type Error = RateError;

    fn try_from(hz: u32) -> Result<Self, Self::Error> {
        Self::new(hz)
    }
}

impl From<SampleRate> for u32 {
    fn from(rate: SampleRate) -> Self {
        rate.0
    }
}

impl FromStr for SampleRate {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hz = s.trim().parse::<u32>().map_err(|_| RateError::NotANumber)?;
        Self::new(hz)
    }
}

impl fmt::Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} S/s", self.0)
    }
}
