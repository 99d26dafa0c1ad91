//! Blocking reader and writer adapters over byte streams.

use std::io::{ErrorKind, Read, Write};

use memchr::memchr;
use tracing::{debug, trace};

use crate::error::{FrameError, Result};
use crate::frame::{decode_body, encode_frame_into, DecodedFrame, FrameConfig};
use crate::BOUNDARY;

const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Escaped bytes of a frame that has not yet been terminated.
///
/// Returned by [`FrameReader::take_remainder`] when a stream stops mid-frame.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FrameRemainder {
    /// Raw (still escaped) bytes collected since the last boundary marker.
    pub escaped: Vec<u8>,
}

impl FrameRemainder {
    /// Number of buffered escaped bytes.
    pub fn len(&self) -> usize {
        self.escaped.len()
    }

    /// Check if nothing was buffered.
    pub fn is_empty(&self) -> bool {
        self.escaped.is_empty()
    }
}

/// Splits a byte stream on boundary markers and decodes each frame body.
///
/// Empty segments between adjacent markers are skipped, so both
/// `7E body 7E 7E body 7E` and `body 7E body 7E` streams yield every frame.
#[derive(Debug, Default)]
pub(crate) struct FrameAssembler {
    body: Vec<u8>,
    discarding: bool,
    config: FrameConfig,
}

impl FrameAssembler {
    pub(crate) fn new(config: FrameConfig) -> Self {
        Self {
            body: Vec::new(),
            discarding: false,
            config,
        }
    }

    pub(crate) fn config(&self) -> &FrameConfig {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut FrameConfig {
        &mut self.config
    }

    /// Consume bytes from `input` up to and including the next completed frame.
    ///
    /// Returns how many bytes were consumed and the frame outcome, if one
    /// completed. Errors only affect the frame they belong to; the assembler
    /// is ready for the next frame afterwards.
    pub(crate) fn feed(&mut self, input: &[u8]) -> (usize, Option<Result<DecodedFrame>>) {
        let mut offset = 0usize;
        while let Some(rel) = memchr(BOUNDARY, &input[offset..]) {
            let pos = offset + rel;
            let overflow = self.extend(&input[offset..pos]);
            offset = pos + 1;

            // The boundary ends any frame being discarded.
            let was_discarding = std::mem::replace(&mut self.discarding, false);
            if let Err(err) = overflow {
                return (offset, Some(Err(err)));
            }
            if was_discarding || self.body.is_empty() {
                continue;
            }

            let body = std::mem::take(&mut self.body);
            return (offset, Some(self.finish(&body)));
        }

        let overflow = self.extend(&input[offset..]);
        (input.len(), overflow.err().map(Err))
    }

    /// Buffered escaped bytes of the current frame.
    pub(crate) fn pending(&self) -> &[u8] {
        &self.body
    }

    pub(crate) fn take_pending(&mut self) -> Vec<u8> {
        self.discarding = false;
        std::mem::take(&mut self.body)
    }

    /// Report an unterminated frame at end of stream.
    pub(crate) fn finish_eof(&mut self) -> Result<()> {
        if self.body.is_empty() {
            self.discarding = false;
            return Ok(());
        }
        Err(FrameError::UnexpectedEof {
            buffered: self.body.len(),
        })
    }

    fn extend(&mut self, bytes: &[u8]) -> Result<()> {
        if self.discarding || bytes.is_empty() {
            return Ok(());
        }
        let size = self.body.len() + bytes.len();
        if size > self.config.max_frame_size {
            debug!(
                size,
                max = self.config.max_frame_size,
                "discarding oversized frame"
            );
            self.body.clear();
            self.discarding = true;
            return Err(FrameError::FrameTooLarge {
                size,
                max: self.config.max_frame_size,
            });
        }
        self.body.extend_from_slice(bytes);
        Ok(())
    }

    fn finish(&self, body: &[u8]) -> Result<DecodedFrame> {
        let frame = decode_body(body)?;
        if !frame.is_valid() {
            trace!(checksum = ?frame.checksum, len = frame.payload.len(), "frame checksum mismatch");
        } else {
            trace!(len = frame.payload.len(), "frame decoded");
        }
        self.config.apply(frame)
    }
}

/// Writer wrapper that frames every payload before forwarding it.
///
/// Each call to [`write_frame`](FrameWriter::write_frame) emits exactly one
/// complete frame with both boundary markers.
pub struct FrameWriter<W> {
    inner: W,
    scratch: Vec<u8>,
}

impl<W> FrameWriter<W> {
    /// Construct a new frame writer around the provided sink.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            scratch: Vec::new(),
        }
    }

    /// Borrow the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Mutably borrow the underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consume the wrapper and return the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> FrameWriter<W> {
    /// Encode `payload` and write the frame in a single `write_all`.
    pub fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        self.scratch.clear();
        encode_frame_into(payload, &mut self.scratch);
        self.inner.write_all(&self.scratch)?;
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(FrameError::from)
    }
}

/// Reader wrapper that decodes frames from an underlying byte stream.
///
/// Malformed frames and, under [`ChecksumPolicy::Reject`](crate::ChecksumPolicy::Reject),
/// checksum mismatches are returned as errors; the reader stays usable and the
/// next call continues with the following frame.
pub struct FrameReader<R> {
    inner: R,
    assembler: FrameAssembler,
    unread: Vec<u8>,
}

impl<R> FrameReader<R> {
    /// Construct a frame reader with the default configuration.
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Construct a frame reader with a custom size limit and checksum policy.
    pub fn with_config(inner: R, config: FrameConfig) -> Self {
        Self {
            inner,
            assembler: FrameAssembler::new(config),
            unread: Vec::new(),
        }
    }

    /// Active reader configuration.
    pub fn config(&self) -> &FrameConfig {
        self.assembler.config()
    }

    /// Update the maximum escaped frame size for subsequent frames.
    pub fn set_max_frame_size(&mut self, max_frame_size: usize) {
        self.assembler.config_mut().max_frame_size = max_frame_size;
    }

    /// Borrow the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the wrapper and return the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Check if part of a frame is currently buffered.
    pub fn has_remainder(&self) -> bool {
        !self.assembler.pending().is_empty()
    }

    /// Take the escaped bytes of the current, unterminated frame.
    ///
    /// ```
    /// use qcdm_hdlc::{encode_frame, FrameError, FrameReader};
    /// use std::io::Cursor;
    ///
    /// let mut encoded = encode_frame(b"data");
    /// encoded.pop();
    /// let mut reader = FrameReader::new(Cursor::new(encoded));
    /// assert!(matches!(
    ///     reader.read_frame(),
    ///     Err(FrameError::UnexpectedEof { buffered: 6 })
    /// ));
    /// let remainder = reader.take_remainder();
    /// assert_eq!(&remainder.escaped[..4], b"data");
    /// assert!(!reader.has_remainder());
    /// ```
    pub fn take_remainder(&mut self) -> FrameRemainder {
        FrameRemainder {
            escaped: self.assembler.take_pending(),
        }
    }
}

impl<R: Read> FrameReader<R> {
    /// Read the next frame.
    ///
    /// Returns `Ok(None)` at end of stream when no partial frame is buffered.
    pub fn read_frame(&mut self) -> Result<Option<DecodedFrame>> {
        loop {
            if !self.unread.is_empty() {
                let (consumed, outcome) = self.assembler.feed(&self.unread);
                self.unread.drain(..consumed);
                if let Some(outcome) = outcome {
                    return outcome.map(Some);
                }
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                self.assembler.finish_eof()?;
                return Ok(None);
            }

            self.unread.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read frames until end of stream, collecting payloads that verify.
    ///
    /// Stops at the first error.
    pub fn read_verified_frames(&mut self) -> Result<Vec<Vec<u8>>> {
        let mut frames = Vec::new();
        while let Some(frame) = self.read_frame()? {
            frames.push(frame.into_verified()?);
        }
        Ok(frames)
    }
}
