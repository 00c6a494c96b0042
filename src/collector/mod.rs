//! Per-round collectors
//!
//! Each collector makes one bounded call and turns the untrusted reply
//! into `crate::types`. None of them fail: errors are logged and replaced
//! by the default value for that peer.

mod health;
mod history;
mod tasks;

pub use health::*;
pub use history::*;
pub use tasks::*;

use std::future::Future;
use std::time::Duration;

use crate::transport::{TransportError, TransportResult};

/// Run a transport call under its own deadline
pub(crate) async fn bounded<T, F>(timeout: Duration, call: F) -> TransportResult<T>
where
    F: Future<Output = TransportResult<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(timeout.as_millis() as u64)),
    }
}
