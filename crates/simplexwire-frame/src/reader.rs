use std::io::Read;

use bytes::Bytes;
use simplexwire_transport::SimplexStream;
use tracing::trace;

use crate::codec::{read_frame, read_frame_into, FrameConfig};
use crate::error::{FrameError, Result};

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete payloads.
/// No bytes are buffered between calls, so the reader holds no state beyond
/// the stream position.
///
/// Any failure other than a timeout on a frame boundary leaves the stream
/// misaligned. The reader then refuses further reads with
/// [`FrameError::ConnectionClosed`].
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
    poisoned: bool,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            config,
            poisoned: false,
        }
    }

    /// Read the next complete frame (blocking).
    pub fn read_frame(&mut self) -> Result<Bytes> {
        self.check_usable()?;
        let payload =
            read_frame(&mut self.inner, self.config.max_frame_size).map_err(|err| self.fail(err))?;
        trace!(len = payload.len(), "frame received");
        Ok(payload)
    }

    /// Read the next frame into `buf`, replacing its contents.
    pub fn read_frame_into(&mut self, buf: &mut Vec<u8>) -> Result<()> {
        if let Err(err) = self.check_usable() {
            buf.clear();
            return Err(err);
        }
        read_frame_into(&mut self.inner, self.config.max_frame_size, buf)
            .map_err(|err| self.fail(err))?;
        trace!(len = buf.len(), "frame received");
        Ok(())
    }

    /// True once a failed read has left the stream off a frame boundary.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    fn check_usable(&self) -> Result<()> {
        if self.poisoned {
            return Err(FrameError::ConnectionClosed);
        }
        Ok(())
    }

    fn fail(&mut self, err: FrameError) -> FrameError {
        if !err.is_retryable() {
            self.poisoned = true;
        }
        err
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<SimplexStream> {
    /// Create a frame reader for a socket and apply the read timeout from config.
    pub fn with_config_stream(inner: SimplexStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: simplexwire_transport::TransportError) -> FrameError {
    match err {
        simplexwire_transport::TransportError::Io(io)
        | simplexwire_transport::TransportError::Accept(io) => FrameError::Io(io),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
