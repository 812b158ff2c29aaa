use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::endpoint::Endpoint;
use crate::error::{Result, TransportError};
use crate::listener::poll_accept;
use crate::stream::SimplexStream;

/// Listening TCP socket.
#[derive(Debug)]
pub struct TcpSocketListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpSocketListener {
    /// Bind and listen on the first candidate address that accepts the bind.
    pub fn bind(endpoint: &Endpoint, addrs: &[SocketAddr]) -> Result<Self> {
        let mut last_err = None;
        for addr in addrs {
            match TcpListener::bind(addr) {
                Ok(listener) => {
                    listener.set_nonblocking(true).map_err(|e| bind_error(endpoint, e))?;
                    let local_addr = listener.local_addr().map_err(|e| bind_error(endpoint, e))?;
                    info!(%local_addr, "listening on tcp socket");
                    return Ok(Self {
                        listener,
                        local_addr,
                    });
                }
                Err(err) => {
                    debug!(%addr, error = %err, "tcp bind candidate failed");
                    last_err = Some(err);
                }
            }
        }
        Err(bind_error(
            endpoint,
            last_err.unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, "no addresses to bind")
            }),
        ))
    }

    /// Accept one incoming connection, waiting no later than `deadline`.
    pub fn accept_until(&self, deadline: Instant, timeout: Duration) -> Result<SimplexStream> {
        let (stream, peer) = poll_accept(|| self.listener.accept(), deadline, timeout)?;
        stream.set_nodelay(true)?;
        let stream = SimplexStream::from_tcp(stream);
        stream.set_nonblocking(false)?;
        debug!(%peer, "accepted connection");
        Ok(stream)
    }

    /// The actual bound address (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// Connect to the first candidate address that answers within `timeout`.
pub fn connect(endpoint: &Endpoint, addrs: &[SocketAddr], timeout: Duration) -> Result<SimplexStream> {
    let mut last_err = None;
    for addr in addrs {
        let attempt = if timeout.is_zero() {
            TcpStream::connect(addr)
        } else {
            TcpStream::connect_timeout(addr, timeout)
        };
        match attempt {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                debug!(%addr, "connected to tcp socket");
                return Ok(SimplexStream::from_tcp(stream));
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(TransportError::Connect {
        endpoint: endpoint.to_string(),
        source: last_err.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, "no addresses to connect to")
        }),
    })
}

fn bind_error(endpoint: &Endpoint, source: std::io::Error) -> TransportError {
    TransportError::Bind {
        endpoint: endpoint.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    fn loopback() -> (Endpoint, Vec<SocketAddr>) {
        let endpoint = Endpoint::network("127.0.0.1", 0);
        let addrs = vec!["127.0.0.1:0".parse().unwrap()];
        (endpoint, addrs)
    }

    #[test]
    fn bind_accept_connect() {
        let (endpoint, addrs) = loopback();
        let listener = TcpSocketListener::bind(&endpoint, &addrs).unwrap();
        let bound = listener.local_addr();
        assert_ne!(bound.port(), 0);

        let handle = std::thread::spawn(move || {
            let target = Endpoint::from(bound);
            let mut client = connect(&target, &[bound], Duration::from_secs(5)).unwrap();
            client.write_all(b"ping").unwrap();
        });

        let timeout = Duration::from_secs(5);
        let mut server = listener
            .accept_until(Instant::now() + timeout, timeout)
            .unwrap();
        let mut buf = [0u8; 4];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");
        assert!(server.peer_description().starts_with("tcp://127.0.0.1:"));

        handle.join().unwrap();
    }

    #[test]
    fn accept_times_out_without_client() {
        let (endpoint, addrs) = loopback();
        let listener = TcpSocketListener::bind(&endpoint, &addrs).unwrap();
        let timeout = Duration::from_millis(30);
        let err = listener
            .accept_until(Instant::now() + timeout, timeout)
            .unwrap_err();
        assert!(matches!(err, TransportError::Timeout { .. }));
    }

    #[test]
    fn connect_refused_when_nobody_listens() {
        let (endpoint, addrs) = loopback();
        let port = TcpSocketListener::bind(&endpoint, &addrs)
            .unwrap()
            .local_addr();
        // listener dropped: the port is now closed
        let err = connect(&Endpoint::from(port), &[port], Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }

    #[test]
    fn bind_conflict_reports_bind_error() {
        let (endpoint, addrs) = loopback();
        let first = TcpSocketListener::bind(&endpoint, &addrs).unwrap();
        let taken = first.local_addr();
        let err = TcpSocketListener::bind(&Endpoint::from(taken), &[taken]).unwrap_err();
        assert!(matches!(err, TransportError::Bind { .. }));
    }
}
