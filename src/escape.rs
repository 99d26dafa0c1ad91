//! Byte stuffing for the reserved [`BOUNDARY`] and [`ESCAPE`] values.

use memchr::{memchr, memchr2_iter};

use crate::error::{FrameError, Result};
use crate::{BOUNDARY, ESCAPE, ESCAPE_MASK};

/// Length of `escape(data)` without allocating.
///
/// ```
/// use qcdm_hdlc::{escaped_len, BOUNDARY, ESCAPE};
///
/// assert_eq!(escaped_len(&[BOUNDARY, ESCAPE, 0x01]), 5);
/// ```
pub fn escaped_len(data: &[u8]) -> usize {
    data.len() + memchr2_iter(BOUNDARY, ESCAPE, data).count()
}

/// Replace every reserved byte with `ESCAPE, byte ^ ESCAPE_MASK`.
pub fn escape(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(escaped_len(data));
    escape_into(data, &mut out);
    out
}

/// Append the escaped form of `data` to `out`.
pub fn escape_into(data: &[u8], out: &mut Vec<u8>) {
    out.reserve(escaped_len(data));
    let mut start = 0usize;
    for pos in memchr2_iter(BOUNDARY, ESCAPE, data) {
        if pos > start {
            out.extend_from_slice(&data[start..pos]);
        }
        out.extend_from_slice(&[ESCAPE, data[pos] ^ ESCAPE_MASK]);
        start = pos + 1;
    }
    if start < data.len() {
        out.extend_from_slice(&data[start..]);
    }
}

/// Length of `unescape(data)`, validating that no escape is truncated.
///
/// Each escape marker consumes the byte after it, so `[ESCAPE, ESCAPE]` is a
/// single escaped byte rather than two markers.
pub fn unescaped_len(data: &[u8]) -> Result<usize> {
    let mut escapes = 0usize;
    let mut i = 0usize;
    while let Some(rel) = memchr(ESCAPE, &data[i..]) {
        let pos = i + rel;
        if pos + 1 >= data.len() {
            return Err(FrameError::TruncatedEscape { offset: pos });
        }
        escapes += 1;
        i = pos + 2;
    }
    Ok(data.len() - escapes)
}

/// Collapse escape sequences back into the original bytes.
///
/// The byte following an escape marker is always XORed with [`ESCAPE_MASK`];
/// it is not required to be one of the two canonical escaped values.
///
/// # Errors
///
/// * [`FrameError::TruncatedEscape`] if the input ends with an escape marker.
/// * [`FrameError::Allocation`] if the output buffer cannot be reserved.
pub fn unescape(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    unescape_into(data, &mut out)?;
    Ok(out)
}

/// Append the unescaped form of `data` to `out`.
///
/// On error `out` is left as it was.
pub fn unescape_into(data: &[u8], out: &mut Vec<u8>) -> Result<()> {
    let len = unescaped_len(data)?;
    out.try_reserve_exact(len)?;
    let mut i = 0usize;
    while let Some(rel) = memchr(ESCAPE, &data[i..]) {
        let pos = i + rel;
        if pos > i {
            out.extend_from_slice(&data[i..pos]);
        }
        // unescaped_len already rejected a trailing marker
        out.push(data[pos + 1] ^ ESCAPE_MASK);
        i = pos + 2;
    }
    if i < data.len() {
        out.extend_from_slice(&data[i..]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_passthrough() {
        assert_eq!(escape(b"abc"), b"abc");
        assert!(escape(&[]).is_empty());
    }

    #[test]
    fn escape_reserved_bytes() {
        assert_eq!(
            escape(&[BOUNDARY, 0x01, ESCAPE]),
            vec![ESCAPE, 0x5E, 0x01, ESCAPE, 0x5D]
        );
    }

    #[test]
    fn escape_only_reserved() {
        let data = [BOUNDARY, BOUNDARY, ESCAPE, ESCAPE];
        let escaped = escape(&data);
        assert_eq!(escaped.len(), 8);
        assert_eq!(escaped.len(), escaped_len(&data));
        assert_eq!(
            escaped,
            vec![ESCAPE, 0x5E, ESCAPE, 0x5E, ESCAPE, 0x5D, ESCAPE, 0x5D]
        );
    }

    #[test]
    fn escaped_output_has_no_literal_boundary() {
        let data: Vec<u8> = (0..=255).collect();
        let escaped = escape(&data);
        assert!(!escaped.contains(&BOUNDARY));
        for (i, &b) in escaped.iter().enumerate() {
            if b == ESCAPE {
                assert!(matches!(escaped.get(i + 1), Some(0x5E) | Some(0x5D)));
            }
        }
    }

    #[test]
    fn escape_into_appends() {
        let mut out = vec![BOUNDARY];
        escape_into(&[0x10, BOUNDARY], &mut out);
        assert_eq!(out, vec![BOUNDARY, 0x10, ESCAPE, 0x5E]);
    }

    #[test]
    fn unescape_inverts_escape() {
        let data: Vec<u8> = (0..=255).chain([BOUNDARY, ESCAPE, ESCAPE]).collect();
        assert_eq!(unescape(&escape(&data)).unwrap(), data);
    }

    #[test]
    fn unescape_leaves_boundary_untouched() {
        let data = [BOUNDARY, 0x01, ESCAPE, 0x5E, BOUNDARY];
        assert_eq!(unescape(&data).unwrap(), vec![BOUNDARY, 0x01, BOUNDARY, BOUNDARY]);
    }

    #[test]
    fn unescape_consumes_escaped_escape_marker() {
        // 0x7D 0x7D is one escape whose value is 0x7D ^ 0x20.
        assert_eq!(unescaped_len(&[ESCAPE, ESCAPE]).unwrap(), 1);
        assert_eq!(unescape(&[ESCAPE, ESCAPE]).unwrap(), vec![0x5D]);
    }

    #[test]
    fn unescape_non_canonical_value() {
        assert_eq!(unescape(&[ESCAPE, 0x21, 0x02]).unwrap(), vec![0x01, 0x02]);
    }

    #[test]
    fn unescape_trailing_marker_rejected() {
        let err = unescape(&[0x01, 0x02, ESCAPE]).unwrap_err();
        assert!(matches!(err, FrameError::TruncatedEscape { offset: 2 }));

        let err = unescape(&[ESCAPE]).unwrap_err();
        assert!(matches!(err, FrameError::TruncatedEscape { offset: 0 }));
    }

    #[test]
    fn unescape_trailing_marker_after_pair_rejected() {
        let err = unescaped_len(&[ESCAPE, 0x5E, ESCAPE]).unwrap_err();
        assert!(matches!(err, FrameError::TruncatedEscape { offset: 2 }));
    }

    #[test]
    fn unescape_into_untouched_on_error() {
        let mut out = vec![0xAA];
        assert!(unescape_into(&[0x01, ESCAPE], &mut out).is_err());
        assert_eq!(out, vec![0xAA]);
    }

    #[test]
    fn unescape_empty() {
        assert!(unescape(&[]).unwrap().is_empty());
        assert_eq!(unescaped_len(&[]).unwrap(), 0);
    }
}
