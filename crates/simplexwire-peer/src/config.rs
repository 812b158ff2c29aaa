use std::time::Duration;

use simplexwire_frame::{FrameConfig, DEFAULT_MAX_FRAME_SIZE};

use crate::retry::RetryPolicy;

/// Default bound for every blocking operation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings shared by [`Producer`](crate::Producer) and [`Consumer`](crate::Consumer).
#[derive(Debug, Clone)]
pub struct PeerConfig {
    /// Bound for bind+accept, each connect attempt, and every send/recv.
    /// Zero disables socket read/write timeouts.
    pub timeout: Duration,
    /// How long a consumer keeps retrying its initial connect. Zero retries forever.
    pub connect_timeout: Duration,
    /// Largest payload accepted on receive and allowed on send.
    pub max_frame_size: usize,
    /// Backoff between connect attempts.
    pub retry: RetryPolicy,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_TIMEOUT,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            retry: RetryPolicy::default(),
        }
    }
}

impl PeerConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Frame reader/writer settings derived from this config.
    pub fn frame_config(&self) -> FrameConfig {
        let io_timeout = (!self.timeout.is_zero()).then_some(self.timeout);
        FrameConfig {
            max_frame_size: self.max_frame_size,
            read_timeout: io_timeout,
            write_timeout: io_timeout,
        }
    }
}
