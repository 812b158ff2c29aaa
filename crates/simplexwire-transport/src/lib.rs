//! Endpoint addressing and blocking stream sockets for simplexwire.
//!
//! Provides one connection type over two socket families:
//! - TCP (`Endpoint::Network`)
//! - Unix domain sockets (`Endpoint::Local`, Unix only)
//!
//! This is the lowest layer of simplexwire. Everything else builds on top of
//! the [`SimplexStream`] type provided here.

pub mod endpoint;
pub mod error;
pub mod listener;
pub mod stream;
pub mod tcp;

#[cfg(unix)]
pub mod uds;

pub use endpoint::{Endpoint, ResolvedEndpoint};
pub use error::{Result, TransportError};
pub use listener::{connect, StreamListener};
pub use stream::SimplexStream;

#[cfg(unix)]
pub use uds::UnixSocketListener;
