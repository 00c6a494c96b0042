//! Peer bookkeeping
//!
//! - `registry`: the configured peers, validated and ordered
//! - `topology`: edges and layout derived from each round

pub mod registry;
pub mod topology;

pub use registry::*;
pub use topology::*;
