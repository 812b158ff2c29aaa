use std::io::{ErrorKind, Read};
use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, ReadStage, Result};

/// Length prefix: one little-endian signed 64-bit integer.
pub const PREFIX_SIZE: usize = 8;

/// Default maximum payload size: 64 MiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Encode one frame into `dst`.
///
/// Wire format:
/// ```text
/// ┌────────────────────────┬──────────────────────┐
/// │ Length N (8B, i64 LE)  │ Payload (N bytes)    │
/// └────────────────────────┴──────────────────────┘
/// ```
///
/// There is no magic, version, checksum or type tag. A reader that loses
/// track of a boundary cannot resynchronize.
pub fn encode_frame(payload: &[u8], dst: &mut impl BufMut) -> Result<()> {
    let len = i64::try_from(payload.len()).map_err(|_| FrameError::FrameTooLarge {
        size: payload.len() as u64,
        max: i64::MAX as usize,
    })?;
    dst.put_i64_le(len);
    dst.put_slice(payload);
    Ok(())
}

/// Encode one frame into a fresh buffer.
pub fn encode_frame_to_vec(payload: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(PREFIX_SIZE + payload.len());
    encode_frame(payload, &mut out)?;
    Ok(out)
}

/// Interpret a length prefix, enforcing `0 <= N <= max_frame_size`.
pub fn decode_length(prefix: [u8; PREFIX_SIZE], max_frame_size: usize) -> Result<usize> {
    let declared = i64::from_le_bytes(prefix);
    if declared < 0 {
        return Err(FrameError::InvalidLength(declared));
    }
    let size = declared as u64;
    if size > max_frame_size as u64 {
        return Err(FrameError::FrameTooLarge {
            size,
            max: max_frame_size,
        });
    }
    Ok(size as usize)
}

/// Decode a frame from an in-memory buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_frame_size: usize) -> Result<Option<Bytes>> {
    if src.len() < PREFIX_SIZE {
        return Ok(None);
    }

    let mut prefix = [0u8; PREFIX_SIZE];
    prefix.copy_from_slice(&src[..PREFIX_SIZE]);
    let len = decode_length(prefix, max_frame_size)?;

    let total = PREFIX_SIZE + len;
    if src.len() < total {
        src.reserve(total - src.len());
        return Ok(None);
    }

    src.advance(PREFIX_SIZE);
    Ok(Some(src.split_to(len).freeze()))
}

/// Read exactly one frame from a blocking stream.
pub fn read_frame<R: Read>(src: &mut R, max_frame_size: usize) -> Result<Bytes> {
    let mut payload = Vec::new();
    read_frame_into(src, max_frame_size, &mut payload)?;
    Ok(Bytes::from(payload))
}

/// Read exactly one frame into `buf`, which is cleared first.
///
/// The prefix is validated before `buf` grows, so an oversized or negative
/// length never causes an allocation. On error `buf` is left empty.
pub fn read_frame_into<R: Read>(src: &mut R, max_frame_size: usize, buf: &mut Vec<u8>) -> Result<()> {
    buf.clear();

    let mut prefix = [0u8; PREFIX_SIZE];
    read_full(src, &mut prefix, ReadStage::Prefix)?;
    let len = decode_length(prefix, max_frame_size)?;

    buf.resize(len, 0);
    if let Err(err) = read_full(src, buf, ReadStage::Payload) {
        buf.clear();
        return Err(err);
    }
    Ok(())
}

/// Fill `dst` completely, looping over short reads.
///
/// A timeout is reported as [`FrameError::Timeout`] only while nothing of the
/// frame has been consumed. Once any byte is in, the frame boundary is lost and
/// the timeout becomes a `ShortRead` carrying the timeout as its source.
fn read_full<R: Read>(src: &mut R, dst: &mut [u8], stage: ReadStage) -> Result<()> {
    let mut filled = 0usize;
    while filled < dst.len() {
        match src.read(&mut dst[filled..]) {
            Ok(0) => return Err(short_read(stage, dst.len(), filled, None)),
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if is_timeout(&err) && stage == ReadStage::Prefix && filled == 0 => {
                return Err(FrameError::Timeout)
            }
            Err(err) => return Err(short_read(stage, dst.len(), filled, Some(err))),
        }
    }
    Ok(())
}

fn short_read(
    stage: ReadStage,
    expected: usize,
    received: usize,
    source: Option<std::io::Error>,
) -> FrameError {
    FrameError::ShortRead {
        stage,
        expected: expected as u64,
        received: received as u64,
        source,
    }
}

/// Socket timeouts surface as `WouldBlock` on Unix and `TimedOut` on Windows.
pub(crate) fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

/// Configuration for frame readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 64 MiB.
    pub max_frame_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
