//! Fixed-capacity frame of encoded samples

use crate::{CodecError, FRAME_CAPACITY, FRAME_DATA_LEN, FRAME_TERMINATOR};
use std::fmt;

/// A block of encoded characters queued for transmission.
///
/// Only the first `len` bytes are meaningful. A sealed frame is exactly
/// [`FRAME_CAPACITY`] bytes long and ends in [`FRAME_TERMINATOR`].
#[derive(Clone, Copy)]
pub struct Frame {
    data: [u8; FRAME_CAPACITY],
    len: usize,
}

impl Frame {
    /// An empty frame
    pub const fn new() -> Self {
        Self {
            data: [0; FRAME_CAPACITY],
            len: 0,
        }
    }

    /// Rebuild a frame from raw slot storage. `len` is clamped to the capacity.
    pub const fn from_raw(data: [u8; FRAME_CAPACITY], len: usize) -> Self {
        let len = if len > FRAME_CAPACITY {
            FRAME_CAPACITY
        } else {
            len
        };
        Self { data, len }
    }

    /// Copy a byte slice into a new frame
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() > FRAME_CAPACITY {
            return Err(CodecError::TooLong {
                len: bytes.len(),
                capacity: FRAME_CAPACITY,
            });
        }
        let mut frame = Self::new();
        frame.data[..bytes.len()].copy_from_slice(bytes);
        frame.len = bytes.len();
        Ok(frame)
    }

    /// The meaningful bytes of this frame
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Full backing storage, including bytes past `len`
    pub fn raw(&self) -> &[u8; FRAME_CAPACITY] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the frame is complete and ready to send
    pub fn is_sealed(&self) -> bool {
        self.len == FRAME_CAPACITY && self.data[FRAME_DATA_LEN] == FRAME_TERMINATOR
    }

    /// Append two encoded characters. Caller guarantees room for them.
    pub(crate) fn push_pair(&mut self, pair: [u8; 2]) {
        debug_assert!(self.len + 2 <= FRAME_DATA_LEN);
        self.data[self.len] = pair[0];
        self.data[self.len + 1] = pair[1];
        self.len += 2;
    }

    /// Write the terminator and fix the length at capacity
    pub(crate) fn seal(&mut self) {
        self.data[FRAME_DATA_LEN] = FRAME_TERMINATOR;
        self.len = FRAME_CAPACITY;
    }

    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Frame {}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("len", &self.len)
            .field("data", &String::from_utf8_lossy(self.as_bytes()))
            .finish()
    }
}
