//! Sample Frame Codec
//!
//! Packs 12-bit converter samples into fixed-length printable frames for
//! transmission over a serial-like channel, and unpacks them on the host.
//!
//! Each sample becomes two characters of a 64-symbol alphabet (low 6 bits
//! first). A frame holds [`SAMPLES_PER_FRAME`] samples followed by `\n`.

mod alphabet;
mod decoder;
mod encoder;
mod error;
mod frame;

pub use alphabet::{decode_symbol, encode_sample, ALPHABET};
pub use decoder::{decode_frame, FrameSamples};
pub use encoder::FrameEncoder;
pub use error::CodecError;
pub use frame::Frame;

/// Total bytes in a sealed frame, terminator included
pub const FRAME_CAPACITY: usize = 63;

/// Encoded characters carried by a sealed frame
pub const FRAME_DATA_LEN: usize = FRAME_CAPACITY - 1;

/// Samples carried by a sealed frame (two characters each)
pub const SAMPLES_PER_FRAME: usize = FRAME_DATA_LEN / 2;

/// Byte that closes every sealed frame
pub const FRAME_TERMINATOR: u8 = b'\n';

/// Mask selecting the bits of a sample that survive encoding
pub const SAMPLE_MASK: u16 = 0x0FFF;
