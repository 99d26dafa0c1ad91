//! Frame encoding and decoding.
//!
//! Wire format:
//! ```text
//! ┌──────────┬──────────────────────────────────────┬──────────┐
//! │ 0x7E     │ escaped(payload ++ crc16 LE)         │ 0x7E     │
//! └──────────┴──────────────────────────────────────┴──────────┘
//! ```

use crate::crc::crc16;
use crate::error::{FrameEnd, FrameError, Result};
use crate::escape::{escape_into, escaped_len, unescape_into};
use crate::{BOUNDARY, CHECKSUM_LEN};

/// Smallest valid frame: boundary + checksum + boundary.
pub const MIN_FRAME_LEN: usize = 2 + CHECKSUM_LEN;

/// Default upper bound on the escaped body of a streamed frame: 16 KiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024;

/// Outcome of comparing the embedded checksum with the recomputed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The embedded checksum matches the payload.
    Valid,
    /// The embedded checksum differs from the one computed over the payload.
    Mismatch {
        /// Checksum carried in the frame trailer.
        received: u16,
        /// Checksum computed over the received payload.
        computed: u16,
    },
}

impl Verification {
    fn compare(received: u16, computed: u16) -> Self {
        if received == computed {
            Verification::Valid
        } else {
            Verification::Mismatch { received, computed }
        }
    }

    /// Returns `true` if the checksum verified.
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid)
    }
}

/// A decoded frame together with its checksum verification result.
///
/// The payload always holds every byte between the leading boundary and the
/// checksum trailer, whether or not verification succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Bytes between the leading boundary and the checksum trailer.
    pub payload: Vec<u8>,
    /// Result of checking the trailer against the payload.
    pub checksum: Verification,
}

impl DecodedFrame {
    /// Returns `true` if the frame checksum verified.
    pub fn is_valid(&self) -> bool {
        self.checksum.is_valid()
    }

    /// Return the payload, turning a checksum mismatch into an error.
    pub fn into_verified(self) -> Result<Vec<u8>> {
        match self.checksum {
            Verification::Valid => Ok(self.payload),
            Verification::Mismatch { received, computed } => {
                Err(FrameError::ChecksumMismatch { received, computed })
            }
        }
    }

    /// Return the payload regardless of the verification result.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// How decoders that deliver frames on their own handle checksum mismatches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChecksumPolicy {
    /// Deliver the frame and let the caller inspect [`DecodedFrame::checksum`].
    #[default]
    Report,
    /// Fail with [`FrameError::ChecksumMismatch`].
    Reject,
}

/// Configuration for the streaming reader and codecs.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum escaped body size of a single frame. Default: 16 KiB.
    pub max_frame_size: usize,
    /// What to do with frames whose checksum does not verify.
    pub checksum_policy: ChecksumPolicy,
}

impl FrameConfig {
    /// Set the maximum escaped body size of a streamed frame.
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Set how checksum mismatches are handled.
    pub fn with_checksum_policy(mut self, checksum_policy: ChecksumPolicy) -> Self {
        self.checksum_policy = checksum_policy;
        self
    }

    pub(crate) fn apply(&self, frame: DecodedFrame) -> Result<DecodedFrame> {
        match (self.checksum_policy, frame.checksum) {
            (ChecksumPolicy::Reject, Verification::Mismatch { received, computed }) => {
                Err(FrameError::ChecksumMismatch { received, computed })
            }
            _ => Ok(frame),
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            checksum_policy: ChecksumPolicy::default(),
        }
    }
}

/// Checksum trailer of `payload` and the escaped size of the whole frame.
fn frame_layout(payload: &[u8]) -> ([u8; CHECKSUM_LEN], usize) {
    let checksum = crc16(payload).to_le_bytes();
    let len = 2 + escaped_len(payload) + escaped_len(&checksum);
    (checksum, len)
}

/// Write a frame whose trailer and size were already computed.
fn write_frame(payload: &[u8], checksum: &[u8; CHECKSUM_LEN], len: usize, out: &mut Vec<u8>) {
    out.reserve(len);
    out.push(BOUNDARY);
    escape_into(payload, out);
    escape_into(checksum, out);
    out.push(BOUNDARY);
}

/// Size of `encode_frame(payload)` without allocating.
pub fn encoded_frame_len(payload: &[u8]) -> usize {
    frame_layout(payload).1
}

/// Build a complete frame around `payload`.
///
/// ```
/// use qcdm_hdlc::{decode_frame, encode_frame, BOUNDARY};
///
/// let frame = encode_frame(&[0x01, 0x02, 0x03, 0x04]);
/// assert_eq!(frame, vec![BOUNDARY, 0x01, 0x02, 0x03, 0x04, 0x91, 0x39, BOUNDARY]);
/// assert_eq!(decode_frame(&frame).unwrap().into_verified().unwrap(), [1, 2, 3, 4]);
/// ```
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let (checksum, len) = frame_layout(payload);
    let mut out = Vec::with_capacity(len);
    write_frame(payload, &checksum, len, &mut out);
    out
}

/// Append a complete frame around `payload` to `out`.
pub fn encode_frame_into(payload: &[u8], out: &mut Vec<u8>) {
    let (checksum, len) = frame_layout(payload);
    write_frame(payload, &checksum, len, out);
}

/// Decode a single frame, including both boundary markers.
///
/// A checksum mismatch is not an error here; it is reported through
/// [`DecodedFrame::checksum`].
///
/// # Errors
///
/// * [`FrameError::TooShort`] if fewer than [`MIN_FRAME_LEN`] bytes remain.
/// * [`FrameError::MissingBoundary`] if either end is not [`BOUNDARY`].
/// * [`FrameError::TruncatedEscape`] if an escape marker has no value byte.
pub fn decode_frame(frame: &[u8]) -> Result<DecodedFrame> {
    if frame.len() < MIN_FRAME_LEN {
        return Err(FrameError::TooShort {
            len: frame.len(),
            min: MIN_FRAME_LEN,
        });
    }
    if frame[0] != BOUNDARY {
        return Err(FrameError::MissingBoundary {
            end: FrameEnd::Leading,
            found: frame[0],
        });
    }
    let last = frame[frame.len() - 1];
    if last != BOUNDARY {
        return Err(FrameError::MissingBoundary {
            end: FrameEnd::Trailing,
            found: last,
        });
    }
    // A boundary byte is never produced by unescaping, so the markers survive
    // and only the body needs to be processed.
    decode_body(&frame[1..frame.len() - 1])
}

/// Decode the escaped bytes between two boundary markers.
///
/// Errors describe the whole frame: lengths include both markers and offsets
/// count from the leading marker.
pub(crate) fn decode_body(body: &[u8]) -> Result<DecodedFrame> {
    let mut unescaped = Vec::new();
    unescape_into(body, &mut unescaped).map_err(|err| match err {
        FrameError::TruncatedEscape { offset } => FrameError::TruncatedEscape { offset: offset + 1 },
        other => other,
    })?;
    if unescaped.len() < CHECKSUM_LEN {
        return Err(FrameError::TooShort {
            len: unescaped.len() + 2,
            min: MIN_FRAME_LEN,
        });
    }

    let payload_len = unescaped.len() - CHECKSUM_LEN;
    let received = u16::from_le_bytes([unescaped[payload_len], unescaped[payload_len + 1]]);
    unescaped.truncate(payload_len);
    let checksum = Verification::compare(received, crc16(&unescaped));

    Ok(DecodedFrame {
        payload: unescaped,
        checksum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ESCAPE;

    #[test]
    fn encode_plain_payload() {
        let frame = encode_frame(&[0x01, 0x02]);
        assert_eq!(frame, vec![BOUNDARY, 0x01, 0x02, 0x8D, 0x35, BOUNDARY]);
        assert_eq!(frame.len(), encoded_frame_len(&[0x01, 0x02]));

        let decoded = decode_frame(&frame).unwrap();
        assert!(decoded.is_valid());
        assert_eq!(decoded.payload, vec![0x01, 0x02]);
    }

    #[test]
    fn encode_escapes_payload() {
        let frame = encode_frame(&[BOUNDARY]);
        assert_eq!(frame, vec![BOUNDARY, ESCAPE, 0x5E, 0x81, 0x6A, BOUNDARY]);
        assert_eq!(decode_frame(&frame).unwrap().into_verified().unwrap(), vec![BOUNDARY]);
    }

    #[test]
    fn encode_escapes_checksum() {
        // crc16([0x60]) has 0x7E as its low byte.
        let frame = encode_frame(&[0x60]);
        assert_eq!(frame, vec![BOUNDARY, 0x60, ESCAPE, 0x5E, 0x93, BOUNDARY]);
        // crc16([0x19]) has 0x7D as its high byte.
        let frame = encode_frame(&[0x19]);
        assert_eq!(frame, vec![BOUNDARY, 0x19, 0x38, ESCAPE, 0x5D, BOUNDARY]);
        assert_eq!(frame.len(), encoded_frame_len(&[0x19]));
        assert_eq!(decode_frame(&frame).unwrap().into_verified().unwrap(), vec![0x19]);
    }

    #[test]
    fn empty_payload() {
        let frame = encode_frame(&[]);
        assert_eq!(frame, vec![BOUNDARY, 0x00, 0x00, BOUNDARY]);
        let decoded = decode_frame(&frame).unwrap();
        assert!(decoded.is_valid());
        assert!(decoded.payload.is_empty());
    }

    #[test]
    fn checksum_mismatch_keeps_full_payload() {
        let mut frame = encode_frame(&[0x01, 0x02, 0x03, 0x04]);
        frame[2] ^= 0x01;
        let decoded = decode_frame(&frame).unwrap();
        assert_eq!(decoded.payload, vec![0x01, 0x03, 0x03, 0x04]);
        assert_eq!(
            decoded.checksum,
            Verification::Mismatch {
                received: 0x3991,
                computed: crc16(&[0x01, 0x03, 0x03, 0x04]),
            }
        );
        assert!(matches!(
            decoded.into_verified(),
            Err(FrameError::ChecksumMismatch { received: 0x3991, .. })
        ));
    }

    #[test]
    fn too_short() {
        for frame in [&[][..], &[BOUNDARY][..], &[BOUNDARY, 0x00, BOUNDARY][..]] {
            let err = decode_frame(frame).unwrap_err();
            assert!(matches!(err, FrameError::TooShort { min: 4, .. }), "{err}");
        }
    }

    #[test]
    fn too_short_after_unescape() {
        // Four bytes on the wire, but only one checksum byte once unescaped.
        let err = decode_frame(&[BOUNDARY, ESCAPE, 0x5E, BOUNDARY]).unwrap_err();
        assert!(matches!(err, FrameError::TooShort { len: 3, min: 4 }));
    }

    #[test]
    fn missing_boundaries() {
        let err = decode_frame(&[0x00, 0x01, 0x02, 0x03, BOUNDARY]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::MissingBoundary {
                end: FrameEnd::Leading,
                found: 0x00
            }
        ));

        let err = decode_frame(&[BOUNDARY, 0x01, 0x02, 0x03, 0x04]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::MissingBoundary {
                end: FrameEnd::Trailing,
                found: 0x04
            }
        ));
    }

    #[test]
    fn truncated_escape_before_trailer() {
        let err = decode_frame(&[BOUNDARY, 0x01, 0x02, 0x03, ESCAPE, BOUNDARY]).unwrap_err();
        assert!(matches!(err, FrameError::TruncatedEscape { offset: 4 }));
        assert!(err.is_malformed());
    }

    #[test]
    fn encode_frame_into_appends() {
        let mut out = Vec::new();
        encode_frame_into(b"one", &mut out);
        encode_frame_into(b"two", &mut out);
        assert_eq!(out, [encode_frame(b"one"), encode_frame(b"two")].concat());
    }

    #[test]
    fn encoded_len_counts_escaped_checksum() {
        // Checksums 0x937E and 0x7D38 each need one escape in the trailer.
        for payload in [&[0x60][..], &[0x19], &[BOUNDARY, ESCAPE], &[]] {
            let frame = encode_frame(payload);
            assert_eq!(encoded_frame_len(payload), frame.len());
            assert!(frame.capacity() >= frame.len());

            let mut out = vec![0xAA];
            encode_frame_into(payload, &mut out);
            assert_eq!(out.len(), 1 + frame.len());
        }
        assert_eq!(encoded_frame_len(&[0x60]), 6);
        assert_eq!(encoded_frame_len(&[0x19]), 6);
    }

    #[test]
    fn config_policy() {
        let mismatch = DecodedFrame {
            payload: vec![1],
            checksum: Verification::Mismatch {
                received: 1,
                computed: 2,
            },
        };
        let report = FrameConfig::default();
        assert_eq!(report.apply(mismatch.clone()).unwrap(), mismatch);

        let reject = FrameConfig::default().with_checksum_policy(ChecksumPolicy::Reject);
        assert!(matches!(
            reject.apply(mismatch),
            Err(FrameError::ChecksumMismatch {
                received: 1,
                computed: 2
            })
        ));
    }
}
