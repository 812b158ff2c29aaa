use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use crate::error::Result;

/// A connected stream socket, TCP or Unix domain. Implements `Read + Write`.
///
/// This is the single Connection type the rest of simplexwire works against.
pub struct SimplexStream {
    inner: StreamInner,
}

enum StreamInner {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for SimplexStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            StreamInner::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for SimplexStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            StreamInner::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            StreamInner::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl SimplexStream {
    pub(crate) fn from_tcp(stream: TcpStream) -> Self {
        Self {
            inner: StreamInner::Tcp(stream),
        }
    }

    #[cfg(unix)]
    pub(crate) fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: StreamInner::Unix(stream),
        }
    }

    /// Set read timeout on the underlying socket. A zero duration means no timeout.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        let timeout = timeout.filter(|t| !t.is_zero());
        match &self.inner {
            StreamInner::Tcp(stream) => stream.set_read_timeout(timeout)?,
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.set_read_timeout(timeout)?,
        }
        Ok(())
    }

    /// Set write timeout on the underlying socket. A zero duration means no timeout.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        let timeout = timeout.filter(|t| !t.is_zero());
        match &self.inner {
            StreamInner::Tcp(stream) => stream.set_write_timeout(timeout)?,
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.set_write_timeout(timeout)?,
        }
        Ok(())
    }

    pub(crate) fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        match &self.inner {
            StreamInner::Tcp(stream) => stream.set_nonblocking(nonblocking)?,
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.set_nonblocking(nonblocking)?,
        }
        Ok(())
    }

    /// Shut down both halves of the connection.
    pub fn shutdown(&self) -> Result<()> {
        match &self.inner {
            StreamInner::Tcp(stream) => stream.shutdown(Shutdown::Both)?,
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.shutdown(Shutdown::Both)?,
        }
        Ok(())
    }

    /// Human-readable description of the remote end.
    ///
    /// Unix peers are usually unnamed, in which case this is `"unix:(unnamed)"`.
    pub fn peer_description(&self) -> String {
        match &self.inner {
            StreamInner::Tcp(stream) => stream
                .peer_addr()
                .map(|addr| format!("tcp://{addr}"))
                .unwrap_or_else(|_| "tcp://(unknown)".to_string()),
            #[cfg(unix)]
            StreamInner::Unix(stream) => match stream.peer_addr() {
                Ok(addr) => match addr.as_pathname() {
                    Some(path) => format!("unix:{}", path.display()),
                    None => "unix:(unnamed)".to_string(),
                },
                Err(_) => "unix:(unknown)".to_string(),
            },
        }
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match &self.inner {
            StreamInner::Tcp(_) => "tcp",
            #[cfg(unix)]
            StreamInner::Unix(_) => "unix-domain-socket",
        }
    }
}

impl std::fmt::Debug for SimplexStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimplexStream")
            .field("type", &self.transport_name())
            .field("peer", &self.peer_description())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn unix_pair_reads_and_writes() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut left = SimplexStream::from_unix(left);
        let mut right = SimplexStream::from_unix(right);

        left.write_all(b"abc").unwrap();
        let mut buf = [0u8; 3];
        right.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"abc");
        assert_eq!(right.transport_name(), "unix-domain-socket");
        assert_eq!(right.peer_description(), "unix:(unnamed)");
    }

    #[test]
    #[cfg(unix)]
    fn zero_timeout_means_blocking() {
        let (left, _right) = std::os::unix::net::UnixStream::pair().unwrap();
        let stream = SimplexStream::from_unix(left);
        stream.set_read_timeout(Some(Duration::ZERO)).unwrap();
        stream.set_write_timeout(Some(Duration::ZERO)).unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn shutdown_signals_eof_to_peer() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let left = SimplexStream::from_unix(left);
        let mut right = SimplexStream::from_unix(right);

        left.shutdown().unwrap();
        let mut buf = [0u8; 1];
        assert_eq!(right.read(&mut buf).unwrap(), 0);
    }
}
