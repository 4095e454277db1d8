//! Lock-Free Frame Ring Buffer
//!
//! Fixed-capacity SPSC queue that decouples the sampling interrupt from the
//! USB transmit path. Writes never block and never fail: when the reader
//! falls behind, the oldest unread frames are overwritten and counted as
//! dropped.

mod buffer;

pub use buffer::{Consumer, FrameRing, Producer, DEFAULT_CAPACITY};
pub use frame_codec::Frame;

use serde::{Deserialize, Serialize};

/// Ring buffer with the default 32 slots
pub type DefaultRing = FrameRing<DEFAULT_CAPACITY>;

/// Point-in-time view of ring occupancy and loss
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingStats {
    /// Number of slots
    pub capacity: usize,
    /// Frames waiting to be read
    pub len: usize,
    /// Frames ever written
    pub total_written: usize,
    /// Frames overwritten before the reader reached them
    pub dropped: usize,
}
