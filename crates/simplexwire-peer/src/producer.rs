use std::time::{Duration, Instant};

use simplexwire_frame::{FrameError, FrameWriter};
use simplexwire_transport::{Endpoint, SimplexStream, StreamListener};
use tracing::{debug, info, trace};

use crate::config::PeerConfig;
use crate::error::{PeerError, Result};

/// Lifecycle of a [`Producer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerState {
    Created,
    AddressResolved,
    Bound,
    Listening,
    Connected,
    Sending,
    Closed,
}

/// A producer that has bound its endpoint but not yet accepted its consumer.
///
/// Useful when the caller needs the bound endpoint (for example the port
/// assigned to `tcp://127.0.0.1:0`) before blocking in [`accept`](Self::accept).
pub struct ProducerListener {
    listener: StreamListener,
    config: PeerConfig,
    started: Instant,
    state: ProducerState,
}

impl ProducerListener {
    /// Resolve, bind and listen on `endpoint`.
    ///
    /// The configured timeout starts counting here and also covers
    /// [`accept`](Self::accept).
    pub fn bind(endpoint: &Endpoint, config: PeerConfig) -> Result<Self> {
        let started = Instant::now();
        let mut state = ProducerState::Created;

        endpoint.resolve()?;
        advance(&mut state, ProducerState::AddressResolved);

        let listener = StreamListener::bind(endpoint)?;
        advance(&mut state, ProducerState::Bound);
        advance(&mut state, ProducerState::Listening);

        Ok(Self {
            listener,
            config,
            started,
            state,
        })
    }

    /// Block until exactly one consumer connects or the timeout expires.
    pub fn accept(self) -> Result<Producer> {
        let Self {
            listener,
            config,
            started,
            mut state,
        } = self;

        let deadline = deadline_after(started, config.timeout);
        let stream = listener.accept_until(deadline, config.timeout)?;
        let peer = stream.peer_description();
        let writer = FrameWriter::with_config_stream(stream, config.frame_config())?;
        advance(&mut state, ProducerState::Connected);

        info!(endpoint = %listener.local_endpoint(), %peer, "consumer connected");

        Ok(Producer {
            local: listener.local_endpoint().clone(),
            listener: Some(listener),
            writer: Some(writer),
            peer,
            state,
            frames_sent: 0,
            bytes_sent: 0,
        })
    }

    /// The endpoint actually bound.
    pub fn local_endpoint(&self) -> &Endpoint {
        self.listener.local_endpoint()
    }

    pub fn state(&self) -> ProducerState {
        self.state
    }
}

/// The sending side of a simplex connection.
///
/// Owns the listening socket and the single accepted connection. Both are
/// released by [`close`](Self::close) or on drop, whichever comes first.
pub struct Producer {
    listener: Option<StreamListener>,
    writer: Option<FrameWriter<SimplexStream>>,
    local: Endpoint,
    peer: String,
    state: ProducerState,
    frames_sent: u64,
    bytes_sent: u64,
}

impl Producer {
    /// Bind `endpoint` and wait for one consumer.
    pub fn bind(endpoint: &Endpoint, config: PeerConfig) -> Result<Self> {
        ProducerListener::bind(endpoint, config)?.accept()
    }

    /// Bind without accepting yet. See [`ProducerListener`].
    pub fn listen(endpoint: &Endpoint, config: PeerConfig) -> Result<ProducerListener> {
        ProducerListener::bind(endpoint, config)
    }

    /// Send one payload as a frame.
    ///
    /// An oversized payload, or a timeout before any byte went out, leaves the
    /// connection usable. Any other failure releases it, since the consumer
    /// may now hold a truncated frame; later sends return `ConnectionClosed`.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(PeerError::ConnectionClosed)?;
        if let Err(err) = writer.send(payload) {
            if !err.is_retryable() && !matches!(err, FrameError::FrameTooLarge { .. }) {
                debug!(endpoint = %self.local, error = %err, "dropping failed connection");
                self.close();
            }
            return Err(err.into());
        }

        self.frames_sent += 1;
        self.bytes_sent += payload.len() as u64;
        if self.state == ProducerState::Connected {
            advance(&mut self.state, ProducerState::Sending);
        }
        Ok(())
    }

    /// Release the connection and the listening socket. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(writer) = self.writer.take() {
            let stream = writer.into_inner();
            if let Err(err) = stream.shutdown() {
                debug!(error = %err, "shutdown after send failed");
            }
        }
        if self.listener.take().is_some() {
            debug!(
                endpoint = %self.local,
                frames = self.frames_sent,
                bytes = self.bytes_sent,
                "producer closed"
            );
        }
        self.state = ProducerState::Closed;
    }

    pub fn state(&self) -> ProducerState {
        self.state
    }

    pub fn local_endpoint(&self) -> &Endpoint {
        &self.local
    }

    /// Description of the connected consumer.
    pub fn peer_addr(&self) -> &str {
        &self.peer
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }
}

impl Drop for Producer {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Producer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Producer")
            .field("endpoint", &self.local.to_string())
            .field("peer", &self.peer)
            .field("state", &self.state)
            .finish()
    }
}

fn advance(state: &mut ProducerState, next: ProducerState) {
    trace!(from = ?*state, to = ?next, "producer state");
    *state = next;
}

/// A zero timeout waits indefinitely.
fn deadline_after(started: Instant, timeout: Duration) -> Instant {
    let wait = if timeout.is_zero() {
        Duration::from_secs(u64::from(u32::MAX))
    } else {
        timeout
    };
    started.checked_add(wait).unwrap_or(started)
}
