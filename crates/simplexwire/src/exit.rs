use std::fmt;
use std::io;

use simplexwire_peer::{ErrorKind, PeerError};
use simplexwire_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound
        | io::ErrorKind::PermissionDenied
        | io::ErrorKind::ConnectionRefused => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::InvalidAddress { .. } | TransportError::PathTooLong { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        TransportError::Timeout { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
        TransportError::Accept(source) | TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn peer_error(context: &str, err: PeerError) -> CliError {
    let code = match err.kind() {
        ErrorKind::InvalidAddress => USAGE,
        ErrorKind::Timeout => TIMEOUT,
        ErrorKind::FrameTooLarge | ErrorKind::InvalidLength => DATA_INVALID,
        ErrorKind::ShortRead | ErrorKind::ConnectionClosed => FAILURE,
        ErrorKind::Io => match err {
            PeerError::Transport(err) => return transport_error(context, err),
            _ => INTERNAL,
        },
    };
    CliError::new(code, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use simplexwire_frame::FrameError;

    use super::*;

    #[test]
    fn invalid_address_is_usage_error() {
        let err = "nonsense".parse::<simplexwire_transport::Endpoint>().unwrap_err();
        assert_eq!(peer_error("bind failed", err.into()).code, USAGE);
    }

    #[test]
    fn timeouts_map_to_timeout_code() {
        let err: PeerError = TransportError::Timeout {
            operation: "accept",
            after: Duration::from_secs(1),
        }
        .into();
        assert_eq!(peer_error("accept failed", err).code, TIMEOUT);
        assert_eq!(peer_error("recv", FrameError::Timeout.into()).code, TIMEOUT);
    }

    #[test]
    fn oversized_frames_are_data_invalid() {
        let err: PeerError = FrameError::FrameTooLarge { size: 10, max: 1 }.into();
        assert_eq!(peer_error("recv", err).code, DATA_INVALID);
    }

    #[test]
    fn bind_conflict_is_transport_error() {
        let err: PeerError = TransportError::Bind {
            endpoint: "tcp://127.0.0.1:1".to_string(),
            source: io::Error::from(io::ErrorKind::AddrInUse),
        }
        .into();
        let cli = peer_error("bind failed", err);
        assert_eq!(cli.code, TRANSPORT_ERROR);
        assert!(cli.message.starts_with("bind failed: "));
    }

    #[test]
    fn permission_errors_use_listed_codes() {
        let err: PeerError = TransportError::Bind {
            endpoint: "unix:/root/forbidden.sock".to_string(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        }
        .into();
        assert_eq!(peer_error("bind failed", err).code, TRANSPORT_ERROR);

        let read = io_error("failed reading payload", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(read.code, FAILURE);
    }
}
