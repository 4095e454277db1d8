//! Host-side frame decoding

use crate::alphabet::decode_symbol;
use crate::{CodecError, FRAME_CAPACITY, FRAME_DATA_LEN, FRAME_TERMINATOR, SAMPLES_PER_FRAME};
use serde::{Deserialize, Serialize};

/// Samples recovered from one sealed frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSamples {
    pub samples: Vec<u16>,
}

impl FrameSamples {
    pub fn min(&self) -> Option<u16> {
        self.samples.iter().copied().min()
    }

    pub fn max(&self) -> Option<u16> {
        self.samples.iter().copied().max()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: u64 = self.samples.iter().map(|&s| s as u64).sum();
        Some(sum as f64 / self.samples.len() as f64)
    }
}

/// Decode a sealed frame (terminator included) back into its samples.
pub fn decode_frame(bytes: &[u8]) -> Result<FrameSamples, CodecError> {
    if bytes.len() != FRAME_CAPACITY {
        return Err(CodecError::BadLength {
            expected: FRAME_CAPACITY,
            actual: bytes.len(),
        });
    }
    if bytes[FRAME_DATA_LEN] != FRAME_TERMINATOR {
        return Err(CodecError::MissingTerminator);
    }

    let symbol = |offset: usize| -> Result<u16, CodecError> {
        let byte = bytes[offset];
        decode_symbol(byte)
            .map(u16::from)
            .ok_or(CodecError::InvalidSymbol {
                offset,
                symbol: byte,
            })
    };

    let mut samples = Vec::with_capacity(SAMPLES_PER_FRAME);
    for pair in 0..SAMPLES_PER_FRAME {
        let low = symbol(pair * 2)?;
        let high = symbol(pair * 2 + 1)?;
        samples.push(low | (high << 6));
    }

    Ok(FrameSamples { samples })
}
