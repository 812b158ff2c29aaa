//! `tokio_util::codec` adapter for the simplexwire frame format.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_frame, DEFAULT_MAX_FRAME_SIZE, PREFIX_SIZE};
use crate::error::{FrameError, ReadStage};

/// Tokio codec over the simplexwire wire format.
///
/// Holds no per-frame state, so one instance per connection is enough and
/// separate connections never share anything.
#[derive(Debug, Clone)]
pub struct SimplexCodec {
    max_frame_size: usize,
}

impl SimplexCodec {
    /// Codec with the default 64 MiB frame limit.
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for SimplexCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for SimplexCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        decode_frame(src, self.max_frame_size)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if src.is_empty() {
            return Ok(None);
        }

        let received = src.len();
        let err = if received < PREFIX_SIZE {
            FrameError::ShortRead {
                stage: ReadStage::Prefix,
                expected: PREFIX_SIZE as u64,
                received: received as u64,
                source: None,
            }
        } else {
            let declared = i64::from_le_bytes(src[..PREFIX_SIZE].try_into().unwrap_or_default());
            FrameError::ShortRead {
                stage: ReadStage::Payload,
                expected: declared as u64,
                received: (received - PREFIX_SIZE) as u64,
                source: None,
            }
        };
        src.clear();
        Err(err)
    }
}

impl Encoder<Bytes> for SimplexCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        <Self as Encoder<&[u8]>>::encode(self, item.as_ref(), dst)
    }
}

impl<'a> Encoder<&'a [u8]> for SimplexCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &'a [u8], dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > self.max_frame_size {
            return Err(FrameError::FrameTooLarge {
                size: item.len() as u64,
                max: self.max_frame_size,
            });
        }
        dst.reserve(PREFIX_SIZE + item.len());
        encode_frame(item, dst)
    }
}
