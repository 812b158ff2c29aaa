use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use simplexwire_transport::SimplexStream;
use tracing::trace;

use crate::codec::{encode_frame, is_timeout, FrameConfig, PREFIX_SIZE};
use crate::error::{FrameError, Result};
use crate::reader::transport_to_frame_error;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete frames to any `Write` stream.
///
/// Prefix and payload go out through one write loop, so a frame is either
/// written in full or the call fails. A failure after part of a frame went
/// out poisons the writer: every later send returns
/// [`FrameError::ConnectionClosed`].
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    poisoned: bool,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            poisoned: false,
        }
    }

    /// Encode and send one payload (blocking).
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        if self.poisoned {
            return Err(FrameError::ConnectionClosed);
        }
        if payload.len() > self.config.max_frame_size {
            return Err(FrameError::FrameTooLarge {
                size: payload.len() as u64,
                max: self.config.max_frame_size,
            });
        }

        self.buf.clear();
        self.buf.reserve(PREFIX_SIZE + payload.len());
        encode_frame(payload, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => {
                    self.poisoned |= offset > 0;
                    return Err(FrameError::ConnectionClosed);
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if offset > 0 => {
                    self.poisoned = true;
                    return Err(FrameError::ShortWrite {
                        expected: self.buf.len() as u64,
                        written: offset as u64,
                        source: err,
                    });
                }
                Err(err) => return Err(write_error(err)),
            }
        }

        self.flush()?;
        trace!(len = payload.len(), "frame sent");
        Ok(())
    }

    /// True once a failed send has left a truncated frame on the wire.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(write_error(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameWriter<SimplexStream> {
    /// Create a frame writer for a socket and apply the write timeout from config.
    pub fn with_config_stream(inner: SimplexStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

fn write_error(err: std::io::Error) -> FrameError {
    if is_timeout(&err) {
        return FrameError::Timeout;
    }
    match err.kind() {
        ErrorKind::BrokenPipe
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::NotConnected
        | ErrorKind::WriteZero => FrameError::ConnectionClosed,
        _ => FrameError::Io(err),
    }
}
