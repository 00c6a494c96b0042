//! Aggregation round scheduling
//!
//! - `round`: fan-out, join and snapshot assembly for one round
//! - `runner`: single-flight scheduler owning the published snapshot
//! - `auto`: cancellable auto-refresh timer

mod auto;
mod round;
mod runner;

pub use auto::*;
pub use round::*;
pub use runner::*;
