//! Length-prefixed framing for simplex byte streams.
//!
//! Every message is framed as an 8-byte little-endian signed length followed
//! by exactly that many payload bytes. Readers loop over partial reads and
//! enforce a maximum frame size before allocating.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use codec::{
    decode_frame, decode_length, encode_frame, encode_frame_to_vec, read_frame, read_frame_into,
    FrameConfig, DEFAULT_MAX_FRAME_SIZE, PREFIX_SIZE,
};
pub use error::{FrameError, ReadStage, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;

#[cfg(feature = "async")]
pub use async_codec::SimplexCodec;
