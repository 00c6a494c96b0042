//! Peer transport
//!
//! The network seam between the aggregator and its peers:
//! - `PeerTransport`: the three calls a round makes
//! - `HttpTransport`: reqwest implementation used in production
//! - `MockTransport`: scripted in-memory peers for tests

mod http;
#[cfg(test)]
mod mock;
mod traits;

pub use http::*;
#[cfg(test)]
pub use mock::*;
pub use traits::*;
