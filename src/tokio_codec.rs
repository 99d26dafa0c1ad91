use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::frame::{DecodedFrame, FrameConfig};
use crate::stream::FrameAssembler;
use crate::{encode_frame_into, FrameError, Result};

/// Frame codec implementing [`tokio_util::codec::Decoder`] and [`Encoder`].
#[derive(Debug, Default)]
pub struct HdlcCodec {
    assembler: FrameAssembler,
    scratch: Vec<u8>,
}

impl HdlcCodec {
    /// Codec with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec with a custom size limit and checksum policy.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            assembler: FrameAssembler::new(config),
            scratch: Vec::new(),
        }
    }

    /// Active decoder configuration.
    pub fn config(&self) -> &FrameConfig {
        self.assembler.config()
    }

    /// Encode a byte slice without taking ownership of it.
    pub fn encode_slice(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<()> {
        self.scratch.clear();
        encode_frame_into(item, &mut self.scratch);
        dst.extend_from_slice(&self.scratch);
        Ok(())
    }
}

impl Encoder<Vec<u8>> for HdlcCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Vec<u8>, dst: &mut BytesMut) -> Result<()> {
        self.encode_slice(&item, dst)
    }
}

impl Encoder<&[u8]> for HdlcCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<()> {
        self.encode_slice(item, dst)
    }
}

impl Decoder for HdlcCodec {
    type Item = DecodedFrame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.is_empty() {
            return Ok(None);
        }
        let (consumed, outcome) = self.assembler.feed(&src[..]);
        src.advance(consumed);
        outcome.transpose()
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        while !src.is_empty() {
            if let Some(frame) = self.decode(src)? {
                return Ok(Some(frame));
            }
        }
        self.assembler.finish_eof()?;
        Ok(None)
    }
}
