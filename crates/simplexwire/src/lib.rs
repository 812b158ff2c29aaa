//! One-way length-prefixed message streams over TCP and Unix domain sockets.
//!
//! A producer binds, accepts a single consumer and sends frames; the consumer
//! receives them in order. Each frame is an 8-byte little-endian signed length
//! followed by that many payload bytes.
//!
//! # Crate Structure
//!
//! - [`transport`] — Endpoints and stream sockets (TCP, Unix domain)
//! - [`frame`] — Length-prefix framing codec, blocking reader/writer, optional tokio codec
//! - [`peer`] — `Producer` / `Consumer` endpoints (behind `peer` feature)

/// Re-export transport types.
pub mod transport {
    pub use simplexwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use simplexwire_frame::*;
}

/// Re-export producer/consumer types (requires `peer` feature).
#[cfg(feature = "peer")]
pub mod peer {
    pub use simplexwire_peer::*;
}
