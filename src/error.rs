use std::collections::TryReserveError;
use std::io;

/// Which end of a frame a boundary check failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEnd {
    /// The first byte of the frame.
    Leading,
    /// The last byte of the frame.
    Trailing,
}

impl std::fmt::Display for FrameEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameEnd::Leading => f.write_str("leading"),
            FrameEnd::Trailing => f.write_str("trailing"),
        }
    }
}

/// Errors that can occur while framing or deframing.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FrameError {
    /// The frame is shorter than boundary + checksum + boundary.
    #[error("frame too short ({len} bytes, need at least {min})")]
    TooShort {
        /// Frame length in bytes, both markers included.
        len: usize,
        /// Smallest acceptable frame length.
        min: usize,
    },

    /// The first or last byte of the frame is not the boundary marker.
    #[error("missing {end} boundary marker (found 0x{found:02X})")]
    MissingBoundary {
        /// The end that was checked.
        end: FrameEnd,
        /// Byte found in place of the marker.
        found: u8,
    },

    /// An escape marker was the last byte of the input.
    #[error("truncated escape sequence at offset {offset}")]
    TruncatedEscape {
        /// Position of the dangling escape marker in the input.
        offset: usize,
    },

    /// The embedded checksum does not match the payload.
    #[error("checksum mismatch (received 0x{received:04X}, computed 0x{computed:04X})")]
    ChecksumMismatch {
        /// Checksum carried in the frame trailer.
        received: u16,
        /// Checksum of the decoded payload.
        computed: u16,
    },

    /// A streamed frame grew past the configured limit.
    #[error("frame too large ({size} escaped bytes, max {max})")]
    FrameTooLarge {
        /// Escaped size reached when the limit was crossed.
        size: usize,
        /// Configured limit.
        max: usize,
    },

    /// The stream ended in the middle of a frame.
    #[error("stream ended with {buffered} bytes of an unterminated frame")]
    UnexpectedEof {
        /// Escaped bytes collected since the last boundary.
        buffered: usize,
    },

    /// The output buffer could not be allocated.
    #[error("failed to allocate frame buffer: {0}")]
    Allocation(#[from] TryReserveError),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FrameError {
    /// Returns `true` for errors caused by a structurally invalid frame.
    ///
    /// A checksum mismatch is not malformed: the frame parsed, its contents just
    /// failed verification.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            FrameError::TooShort { .. }
                | FrameError::MissingBoundary { .. }
                | FrameError::TruncatedEscape { .. }
        )
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, FrameError>;
