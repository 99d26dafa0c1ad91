#![doc = include_str!("../README.md")]

pub mod crc;
pub mod error;
pub mod escape;
pub mod frame;
pub mod stream;

#[cfg(feature = "async-codec")]
pub mod async_codec;
#[cfg(feature = "tokio-codec")]
pub mod tokio_codec;

pub use crc::{crc16, Crc16};
pub use error::{FrameEnd, FrameError, Result};
pub use escape::{escape, escape_into, escaped_len, unescape, unescape_into, unescaped_len};
pub use frame::{
    decode_frame, encode_frame, encode_frame_into, encoded_frame_len, ChecksumPolicy,
    DecodedFrame, FrameConfig, Verification, DEFAULT_MAX_FRAME_SIZE, MIN_FRAME_LEN,
};
pub use stream::{FrameReader, FrameRemainder, FrameWriter};

/// Frame boundary marker (0x7E).
pub const BOUNDARY: u8 = 0x7E;
/// Escape marker (0x7D).
pub const ESCAPE: u8 = 0x7D;
/// Value XORed into an escaped byte (0x20).
pub const ESCAPE_MASK: u8 = 0x20;
/// Escaped form of [`BOUNDARY`] (0x5E).
pub const ESCAPED_BOUNDARY: u8 = BOUNDARY ^ ESCAPE_MASK;
/// Escaped form of [`ESCAPE`] (0x5D).
pub const ESCAPED_ESCAPE: u8 = ESCAPE ^ ESCAPE_MASK;
/// Size of the little-endian checksum trailer.
pub const CHECKSUM_LEN: usize = 2;
