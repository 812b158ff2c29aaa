use std::time::Duration;

use simplexwire_frame::FrameError;
use simplexwire_transport::{Endpoint, TransportError};

/// Errors that can occur in producer and consumer operations.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// Transport-level error (addressing, bind, accept, connect).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Frame-level error (send/recv).
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The consumer gave up connecting.
    #[error("could not connect to {endpoint} after {attempts} attempts in {after:?}: {last_error}")]
    ConnectTimeout {
        endpoint: Endpoint,
        attempts: u32,
        after: Duration,
        #[source]
        last_error: TransportError,
    },

    /// The endpoint was closed locally.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Coarse classification of a [`PeerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed, ambiguous or unresolvable address.
    InvalidAddress,
    /// A bind/accept/connect/send/recv deadline passed.
    Timeout,
    /// The stream ended or failed before a full frame was assembled.
    ShortRead,
    /// Write attempted on a torn-down connection, or a send that tore it down mid-frame.
    ConnectionClosed,
    /// A declared or supplied frame length exceeds the configured maximum.
    FrameTooLarge,
    /// The length prefix was negative.
    InvalidLength,
    /// Any other socket or filesystem failure.
    Io,
}

impl PeerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PeerError::Transport(err) => match err {
                TransportError::InvalidAddress { .. } | TransportError::PathTooLong { .. } => {
                    ErrorKind::InvalidAddress
                }
                TransportError::Timeout { .. } => ErrorKind::Timeout,
                _ => ErrorKind::Io,
            },
            PeerError::Frame(err) => match err {
                FrameError::FrameTooLarge { .. } => ErrorKind::FrameTooLarge,
                FrameError::InvalidLength(_) => ErrorKind::InvalidLength,
                FrameError::ShortRead { .. } => ErrorKind::ShortRead,
                FrameError::Timeout => ErrorKind::Timeout,
                FrameError::ConnectionClosed | FrameError::ShortWrite { .. } => {
                    ErrorKind::ConnectionClosed
                }
                FrameError::Io(_) => ErrorKind::Io,
            },
            PeerError::ConnectTimeout { .. } => ErrorKind::Timeout,
            PeerError::ConnectionClosed => ErrorKind::ConnectionClosed,
        }
    }

    /// True when a consumer saw the producer close cleanly between frames.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, PeerError::Frame(err) if err.is_end_of_stream())
    }
}

pub type Result<T> = std::result::Result<T, PeerError>;

#[cfg(test)]
mod tests {
    use simplexwire_frame::ReadStage;

    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        let invalid: PeerError = "nonsense".parse::<Endpoint>().unwrap_err().into();
        assert_eq!(invalid.kind(), ErrorKind::InvalidAddress);

        let timeout: PeerError = TransportError::Timeout {
            operation: "accept",
            after: Duration::from_secs(1),
        }
        .into();
        assert_eq!(timeout.kind(), ErrorKind::Timeout);

        let short: PeerError = FrameError::ShortRead {
            stage: ReadStage::Payload,
            expected: 10,
            received: 2,
            source: None,
        }
        .into();
        assert_eq!(short.kind(), ErrorKind::ShortRead);
        assert!(!short.is_end_of_stream());

        let large: PeerError = FrameError::FrameTooLarge { size: 9, max: 1 }.into();
        assert_eq!(large.kind(), ErrorKind::FrameTooLarge);

        assert_eq!(PeerError::ConnectionClosed.kind(), ErrorKind::ConnectionClosed);
        let closed: PeerError = FrameError::ConnectionClosed.into();
        assert_eq!(closed.kind(), ErrorKind::ConnectionClosed);

        let torn: PeerError = FrameError::ShortWrite {
            expected: 1008,
            written: 100,
            source: std::io::Error::from(std::io::ErrorKind::WouldBlock),
        }
        .into();
        assert_eq!(torn.kind(), ErrorKind::ConnectionClosed);
    }

    #[test]
    fn clean_eof_is_end_of_stream() {
        let eof: PeerError = FrameError::ShortRead {
            stage: ReadStage::Prefix,
            expected: 8,
            received: 0,
            source: None,
        }
        .into();
        assert!(eof.is_end_of_stream());
        assert_eq!(eof.kind(), ErrorKind::ShortRead);
    }
}
