//! Single-connection producer and consumer endpoints.
//!
//! A [`Producer`] binds an endpoint, accepts exactly one [`Consumer`], and
//! sends frames to it. The consumer connects (retrying until the producer is
//! up) and receives those frames in order. Nothing flows the other way.
//!
//! ```no_run
//! use simplexwire_peer::{Consumer, Endpoint, PeerConfig, Producer};
//!
//! # fn main() -> simplexwire_peer::Result<()> {
//! let endpoint = Endpoint::local("/tmp/simplex.sock");
//!
//! let producer = std::thread::spawn({
//!     let endpoint = endpoint.clone();
//!     move || -> simplexwire_peer::Result<()> {
//!         let mut producer = Producer::bind(&endpoint, PeerConfig::default())?;
//!         producer.send(b"here_is_some_data!")?;
//!         producer.send(b"and some more data")?;
//!         Ok(())
//!     }
//! });
//!
//! let mut consumer = Consumer::connect(&endpoint, PeerConfig::default())?;
//! assert_eq!(consumer.recv()?.as_ref(), b"here_is_some_data!");
//! assert_eq!(consumer.recv()?.as_ref(), b"and some more data");
//! # producer.join().unwrap()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod consumer;
pub mod error;
pub mod producer;
pub mod retry;

pub use config::{PeerConfig, DEFAULT_TIMEOUT};
pub use consumer::{Consumer, ConsumerState};
pub use error::{ErrorKind, PeerError, Result};
pub use producer::{Producer, ProducerListener, ProducerState};
pub use retry::RetryPolicy;
pub use simplexwire_transport::Endpoint;
