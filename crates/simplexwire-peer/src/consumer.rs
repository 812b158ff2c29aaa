use std::time::{Duration, Instant};

use bytes::Bytes;
use simplexwire_frame::{FrameError, FrameReader};
use simplexwire_transport::{connect, Endpoint, SimplexStream};
use tracing::{debug, info, trace};

use crate::config::PeerConfig;
use crate::error::{PeerError, Result};

/// Lifecycle of a [`Consumer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Created,
    AddressResolved,
    Connecting,
    Connected,
    Receiving,
    Closed,
}

/// The receiving side of a simplex connection.
///
/// Connecting polls until the producer is listening, so a consumer may be
/// started first. Once connected nothing is ever written back.
pub struct Consumer {
    reader: Option<FrameReader<SimplexStream>>,
    endpoint: Endpoint,
    state: ConsumerState,
    attempts: u32,
    frames_received: u64,
    bytes_received: u64,
}

impl Consumer {
    /// Connect to `endpoint`, retrying until it accepts or
    /// `config.connect_timeout` has elapsed.
    ///
    /// Address errors (including port 0) are reported immediately; only
    /// connection failures are retried.
    pub fn connect(endpoint: &Endpoint, config: PeerConfig) -> Result<Self> {
        let started = Instant::now();
        let mut state = ConsumerState::Created;

        let resolved = endpoint.resolve_for_connect()?;
        advance(&mut state, ConsumerState::AddressResolved);
        advance(&mut state, ConsumerState::Connecting);

        let mut attempts = 0u32;
        let stream = loop {
            attempts += 1;
            let attempt_timeout = match remaining_connect(&config, started) {
                None => config.timeout,
                Some(remaining) if config.timeout.is_zero() => remaining,
                Some(remaining) => config.timeout.min(remaining),
            };

            match connect(endpoint, &resolved, attempt_timeout) {
                Ok(stream) => break stream,
                Err(err) => {
                    let mut delay = config.retry.delay_for(attempts);
                    if let Some(remaining) = remaining_connect(&config, started) {
                        if remaining.is_zero() {
                            return Err(PeerError::ConnectTimeout {
                                endpoint: endpoint.clone(),
                                attempts,
                                after: started.elapsed(),
                                last_error: err,
                            });
                        }
                        delay = delay.min(remaining);
                    }
                    debug!(%endpoint, attempt = attempts, error = %err, ?delay, "connect failed; retrying");
                    std::thread::sleep(delay);
                }
            }
        };

        let reader = FrameReader::with_config_stream(stream, config.frame_config())?;
        advance(&mut state, ConsumerState::Connected);
        info!(%endpoint, attempts, elapsed = ?started.elapsed(), "connected to producer");

        Ok(Self {
            reader: Some(reader),
            endpoint: endpoint.clone(),
            state,
            attempts,
            frames_received: 0,
            bytes_received: 0,
        })
    }

    /// Receive the next frame (blocking).
    ///
    /// A timeout before any byte of the next frame arrived can be retried.
    /// Every other failure leaves the stream off a frame boundary, so the
    /// connection is released and later calls return `ConnectionClosed`.
    pub fn recv(&mut self) -> Result<Bytes> {
        let reader = self.reader.as_mut().ok_or(PeerError::ConnectionClosed)?;
        match reader.read_frame() {
            Ok(payload) => {
                self.record(payload.len());
                Ok(payload)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Receive the next frame into `buf`, replacing its contents.
    pub fn recv_into(&mut self, buf: &mut Vec<u8>) -> Result<()> {
        let Some(reader) = self.reader.as_mut() else {
            buf.clear();
            return Err(PeerError::ConnectionClosed);
        };
        match reader.read_frame_into(buf) {
            Ok(()) => {
                self.record(buf.len());
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn fail(&mut self, err: FrameError) -> PeerError {
        if !err.is_retryable() {
            debug!(endpoint = %self.endpoint, error = %err, "dropping desynchronized connection");
            self.close();
        }
        err.into()
    }

    /// Release the connection. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(reader) = self.reader.take() {
            let stream = reader.into_inner();
            if let Err(err) = stream.shutdown() {
                debug!(error = %err, "shutdown on close failed");
            }
            debug!(
                endpoint = %self.endpoint,
                frames = self.frames_received,
                bytes = self.bytes_received,
                "consumer closed"
            );
        }
        self.state = ConsumerState::Closed;
    }

    pub fn state(&self) -> ConsumerState {
        self.state
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Connect attempts taken, including the successful one.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    fn record(&mut self, len: usize) {
        self.frames_received += 1;
        self.bytes_received += len as u64;
        if self.state == ConsumerState::Connected {
            advance(&mut self.state, ConsumerState::Receiving);
        }
    }
}

impl Drop for Consumer {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Consumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consumer")
            .field("endpoint", &self.endpoint.to_string())
            .field("state", &self.state)
            .field("attempts", &self.attempts)
            .finish()
    }
}

/// Time left to keep retrying, or `None` when the connect deadline is disabled.
fn remaining_connect(config: &PeerConfig, started: Instant) -> Option<Duration> {
    if config.connect_timeout.is_zero() {
        return None;
    }
    Some(config.connect_timeout.saturating_sub(started.elapsed()))
}

fn advance(state: &mut ConsumerState, next: ConsumerState) {
    trace!(from = ?*state, to = ?next, "consumer state");
    *state = next;
}
