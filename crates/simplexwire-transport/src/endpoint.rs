use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Result, TransportError};

/// Where a producer listens or a consumer connects.
///
/// The address family is always explicit. Textual forms accepted by
/// [`FromStr`]:
///
/// - `tcp://host:port`, `tcp://[::1]:port`
/// - `unix:/path/to.sock`, `unix:///path/to.sock`
/// - bare `host:port` (network)
/// - bare paths containing `/` or ending in `.sock` (local)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// A TCP address.
    Network { host: String, port: u16 },
    /// A Unix domain socket path.
    Local { path: PathBuf },
}

/// An endpoint after name resolution and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedEndpoint {
    Network(Vec<SocketAddr>),
    Local(PathBuf),
}

impl Endpoint {
    /// A TCP endpoint.
    pub fn network(host: impl Into<String>, port: u16) -> Self {
        Self::Network {
            host: host.into(),
            port,
        }
    }

    /// A Unix domain socket endpoint.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::Local { path: path.into() }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local { .. })
    }

    /// The socket path for local endpoints.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Local { path } => Some(path),
            Self::Network { .. } => None,
        }
    }

    /// Classify and resolve this endpoint.
    ///
    /// Network hosts go through the system resolver; every returned address
    /// is a candidate for bind/connect, tried in order.
    pub fn resolve(&self) -> Result<ResolvedEndpoint> {
        match self {
            Self::Network { host, port } => {
                if host.is_empty() {
                    return Err(TransportError::invalid_address(
                        self.to_string(),
                        "host must not be empty",
                    ));
                }
                let addrs: Vec<SocketAddr> = (host.as_str(), *port)
                    .to_socket_addrs()
                    .map_err(|err| TransportError::invalid_address(self.to_string(), err.to_string()))?
                    .collect();
                if addrs.is_empty() {
                    return Err(TransportError::invalid_address(
                        self.to_string(),
                        "host resolved to no addresses",
                    ));
                }
                Ok(ResolvedEndpoint::Network(addrs))
            }
            Self::Local { path } => {
                if path.as_os_str().is_empty() {
                    return Err(TransportError::invalid_address(
                        "",
                        "socket path must not be empty",
                    ));
                }
                Ok(ResolvedEndpoint::Local(path.clone()))
            }
        }
    }

    /// Like [`resolve`](Self::resolve), for the connecting side.
    ///
    /// Port 0 asks the OS for any free port when binding but names nothing to
    /// connect to, so it is rejected here.
    pub fn resolve_for_connect(&self) -> Result<ResolvedEndpoint> {
        if let Self::Network { port: 0, .. } = self {
            return Err(TransportError::invalid_address(
                self.to_string(),
                "port 0 cannot be connected to",
            ));
        }
        self.resolve()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network { host, port } if host.contains(':') => {
                write!(f, "tcp://[{host}]:{port}")
            }
            Self::Network { host, port } => write!(f, "tcp://{host}:{port}"),
            Self::Local { path } => write!(f, "unix:{}", path.display()),
        }
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::network(addr.ip().to_string(), addr.port())
    }
}

impl FromStr for Endpoint {
    type Err = TransportError;

    fn from_str(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(TransportError::invalid_address(input, "address is empty"));
        }

        if let Some(rest) = input.strip_prefix("tcp://") {
            return parse_network(input, rest);
        }
        if let Some(rest) = input
            .strip_prefix("unix://")
            .or_else(|| input.strip_prefix("unix:"))
        {
            if rest.is_empty() {
                return Err(TransportError::invalid_address(input, "socket path is empty"));
            }
            return Ok(Self::local(rest));
        }
        if input.contains('/') || input.ends_with(".sock") {
            return Ok(Self::local(input));
        }
        if input.contains(':') {
            return parse_network(input, input);
        }

        Err(TransportError::invalid_address(
            input,
            "expected tcp://host:port, host:port, unix:PATH or a socket path",
        ))
    }
}

fn parse_network(input: &str, hostport: &str) -> Result<Endpoint> {
    let (host, port) = if let Some(bracketed) = hostport.strip_prefix('[') {
        let (host, rest) = bracketed
            .split_once(']')
            .ok_or_else(|| TransportError::invalid_address(input, "unterminated '[' in host"))?;
        let port = rest
            .strip_prefix(':')
            .ok_or_else(|| TransportError::invalid_address(input, "missing port"))?;
        (host, port)
    } else {
        let (host, port) = hostport
            .rsplit_once(':')
            .ok_or_else(|| TransportError::invalid_address(input, "missing port"))?;
        if host.contains(':') {
            return Err(TransportError::invalid_address(
                input,
                "IPv6 hosts must be written in brackets",
            ));
        }
        (host, port)
    };

    if host.is_empty() {
        return Err(TransportError::invalid_address(input, "host must not be empty"));
    }
    let port: u16 = port
        .parse()
        .map_err(|_| TransportError::invalid_address(input, format!("invalid port {port:?}")))?;

    Ok(Endpoint::network(host, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tcp_scheme() {
        let ep: Endpoint = "tcp://localhost:6000".parse().unwrap();
        assert_eq!(ep, Endpoint::network("localhost", 6000));
        assert!(!ep.is_local());
    }

    #[test]
    fn parses_bare_host_port() {
        let ep: Endpoint = "127.0.0.1:4444".parse().unwrap();
        assert_eq!(ep, Endpoint::network("127.0.0.1", 4444));
    }

    #[test]
    fn parses_bracketed_ipv6() {
        let ep: Endpoint = "tcp://[::1]:7000".parse().unwrap();
        assert_eq!(ep, Endpoint::network("::1", 7000));
        assert_eq!(ep.to_string(), "tcp://[::1]:7000");
    }

    #[test]
    fn parses_unix_forms() {
        let a: Endpoint = "unix:/tmp/a.sock".parse().unwrap();
        let b: Endpoint = "unix:///tmp/a.sock".parse().unwrap();
        let c: Endpoint = "/tmp/a.sock".parse().unwrap();
        let d: Endpoint = "relative.sock".parse().unwrap();
        assert_eq!(a, Endpoint::local("/tmp/a.sock"));
        assert_eq!(b, a);
        assert_eq!(c, a);
        assert_eq!(d.path(), Some(Path::new("relative.sock")));
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(Endpoint::network("localhost", 1).to_string(), "tcp://localhost:1");
        assert_eq!(Endpoint::local("/tmp/x.sock").to_string(), "unix:/tmp/x.sock");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in [
            "",
            "localhost",
            "tcp://localhost",
            "tcp://:80",
            "tcp://host:notaport",
            "tcp://host:70000",
            "::1:80",
            "tcp://[::1",
            "unix:",
        ] {
            let err = bad.parse::<Endpoint>().unwrap_err();
            assert!(
                matches!(err, TransportError::InvalidAddress { .. }),
                "{bad:?} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn resolves_loopback() {
        let resolved = Endpoint::network("127.0.0.1", 9).resolve().unwrap();
        match resolved {
            ResolvedEndpoint::Network(addrs) => {
                assert_eq!(addrs, vec!["127.0.0.1:9".parse::<SocketAddr>().unwrap()]);
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn resolve_rejects_empty_host_and_path() {
        assert!(matches!(
            Endpoint::network("", 80).resolve(),
            Err(TransportError::InvalidAddress { .. })
        ));
        assert!(matches!(
            Endpoint::local("").resolve(),
            Err(TransportError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn port_zero_binds_but_does_not_connect() {
        let any_port = Endpoint::network("127.0.0.1", 0);
        assert!(any_port.resolve().is_ok());
        assert!(matches!(
            any_port.resolve_for_connect(),
            Err(TransportError::InvalidAddress { .. })
        ));
        assert!(Endpoint::network("127.0.0.1", 9).resolve_for_connect().is_ok());
        assert!(Endpoint::local("/tmp/x.sock").resolve_for_connect().is_ok());
    }

    #[test]
    fn from_socket_addr() {
        let addr: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(Endpoint::from(addr), Endpoint::network("127.0.0.1", 5000));
    }
}
