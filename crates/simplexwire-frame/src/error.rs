use std::fmt;

/// Which part of a frame was being read when a read failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStage {
    /// The 8-byte length prefix.
    Prefix,
    /// The payload announced by the prefix.
    Payload,
}

impl fmt::Display for ReadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadStage::Prefix => f.write_str("length prefix"),
            ReadStage::Payload => f.write_str("payload"),
        }
    }
}

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The declared (or supplied) payload length exceeds the configured maximum.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: u64, max: usize },

    /// The length prefix decoded to a negative number.
    #[error("invalid frame length {0}")]
    InvalidLength(i64),

    /// The stream ended or failed before a complete frame was read.
    ///
    /// The stream is desynchronized afterwards and must be discarded.
    #[error("short read in {stage}: got {received} of {expected} bytes")]
    ShortRead {
        stage: ReadStage,
        expected: u64,
        received: u64,
        #[source]
        source: Option<std::io::Error>,
    },

    /// A read or write timed out before any byte of the frame was transferred.
    ///
    /// The stream is still on a frame boundary and may be used again.
    #[error("frame I/O timed out")]
    Timeout,

    /// A write failed after part of the frame was already on the wire.
    ///
    /// The peer now holds a truncated frame; the stream must be discarded.
    #[error("short write: sent {written} of {expected} bytes")]
    ShortWrite {
        expected: u64,
        written: u64,
        #[source]
        source: std::io::Error,
    },

    /// The peer is gone; nothing more can be written.
    #[error("connection closed")]
    ConnectionClosed,

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// True when the stream is still aligned on a frame boundary, so the
    /// same reader or writer can be used again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FrameError::Timeout)
    }

    /// True when the stream ended cleanly on a frame boundary.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(
            self,
            FrameError::ShortRead {
                stage: ReadStage::Prefix,
                received: 0,
                source: None,
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
