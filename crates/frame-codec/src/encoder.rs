//! Stateful sample-to-frame accumulator

use crate::alphabet::encode_sample;
use crate::{Frame, FRAME_DATA_LEN};

/// Accumulates samples into a frame and hands it out once full.
///
/// Owned by the acquisition context; `&mut self` keeps the frame under
/// construction away from every other context.
#[derive(Debug, Default)]
pub struct FrameEncoder {
    current: Frame,
}

impl FrameEncoder {
    pub const fn new() -> Self {
        Self {
            current: Frame::new(),
        }
    }

    /// Append one sample. Returns the sealed frame when this sample fills it;
    /// the encoder then starts over with an empty frame.
    #[inline]
    pub fn push_sample(&mut self, sample: u16) -> Option<Frame> {
        self.current.push_pair(encode_sample(sample));

        if self.current.len() < FRAME_DATA_LEN {
            return None;
        }

        self.current.seal();
        let sealed = self.current;
        self.current.clear();
        Some(sealed)
    }

    /// Characters already written into the frame under construction
    pub fn pending_len(&self) -> usize {
        self.current.len()
    }

    /// Drop the partial frame
    pub fn reset(&mut self) {
        self.current.clear();
    }
}
