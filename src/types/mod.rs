//! Type definitions for fleetwatch
//!
//! Peer descriptors and statuses, exchange records, tasks and the
//! published snapshot.

mod exchange;
mod peer;
mod snapshot;
mod task;

pub use exchange::*;
pub use peer::*;
pub use snapshot::*;
pub use task::*;
