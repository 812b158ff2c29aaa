use std::io::ErrorKind;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::endpoint::{Endpoint, ResolvedEndpoint};
use crate::error::{Result, TransportError};
use crate::stream::SimplexStream;
use crate::tcp::{self, TcpSocketListener};

/// Sleep between non-blocking accept polls.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// A bound, listening socket of either family.
pub struct StreamListener {
    inner: ListenerInner,
    endpoint: Endpoint,
}

enum ListenerInner {
    Tcp(TcpSocketListener),
    #[cfg(unix)]
    Unix(crate::uds::UnixSocketListener),
}

impl StreamListener {
    /// Resolve `endpoint`, then bind and listen on it.
    pub fn bind(endpoint: &Endpoint) -> Result<Self> {
        match endpoint.resolve()? {
            ResolvedEndpoint::Network(addrs) => {
                let listener = TcpSocketListener::bind(endpoint, &addrs)?;
                let bound = Endpoint::from(listener.local_addr());
                Ok(Self {
                    inner: ListenerInner::Tcp(listener),
                    endpoint: bound,
                })
            }
            #[cfg(unix)]
            ResolvedEndpoint::Local(path) => {
                let listener = crate::uds::UnixSocketListener::bind(&path)?;
                Ok(Self {
                    inner: ListenerInner::Unix(listener),
                    endpoint: Endpoint::local(path),
                })
            }
            #[cfg(not(unix))]
            ResolvedEndpoint::Local(_) => Err(unsupported_local(endpoint, true)),
        }
    }

    /// Accept one connection, failing with [`TransportError::Timeout`] once
    /// `deadline` passes. `timeout` is only used for the error report.
    pub fn accept_until(&self, deadline: Instant, timeout: Duration) -> Result<SimplexStream> {
        match &self.inner {
            ListenerInner::Tcp(listener) => listener.accept_until(deadline, timeout),
            #[cfg(unix)]
            ListenerInner::Unix(listener) => listener.accept_until(deadline, timeout),
        }
    }

    /// The endpoint actually bound. For TCP port 0 this carries the assigned port.
    pub fn local_endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl std::fmt::Debug for StreamListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamListener")
            .field("endpoint", &self.endpoint.to_string())
            .finish()
    }
}

/// Make a single connection attempt to a resolved endpoint.
///
/// `timeout` bounds each TCP candidate. It does not apply to Unix sockets:
/// std has no timed connect for them, and the kernel answers a local connect
/// at once (accepted into the backlog, `ENOENT` or `ECONNREFUSED`) unless the
/// listener's backlog is full.
pub fn connect(
    endpoint: &Endpoint,
    resolved: &ResolvedEndpoint,
    timeout: Duration,
) -> Result<SimplexStream> {
    match resolved {
        ResolvedEndpoint::Network(addrs) => tcp::connect(endpoint, addrs, timeout),
        #[cfg(unix)]
        ResolvedEndpoint::Local(path) => crate::uds::connect(path),
        #[cfg(not(unix))]
        ResolvedEndpoint::Local(_) => Err(unsupported_local(endpoint, false)),
    }
}

/// Drive a non-blocking `accept` until it yields a connection or `deadline` passes.
pub(crate) fn poll_accept<S>(
    mut accept: impl FnMut() -> std::io::Result<S>,
    deadline: Instant,
    timeout: Duration,
) -> Result<S> {
    loop {
        match accept() {
            Ok(accepted) => return Ok(accepted),
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(TransportError::Timeout {
                        operation: "accept",
                        after: timeout,
                    });
                }
                trace!("no pending connection; polling");
                std::thread::sleep(ACCEPT_POLL_INTERVAL.min(deadline - now));
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::Accept(err)),
        }
    }
}

#[cfg(not(unix))]
fn unsupported_local(endpoint: &Endpoint, bind: bool) -> TransportError {
    let source = std::io::Error::new(
        ErrorKind::Unsupported,
        "unix domain sockets are not available on this platform",
    );
    if bind {
        TransportError::Bind {
            endpoint: endpoint.to_string(),
            source,
        }
    } else {
        TransportError::Connect {
            endpoint: endpoint.to_string(),
            source,
        }
    }
}
