//! Peer wire protocol
//!
//! Shapes of the JSON documents peers return:
//! - `/health` identity report
//! - `/api/v1/kep/history` exchange entries
//! - JSON-RPC 2.0 envelope used by the `/a2a` task registry
//!
//! Nothing here is trusted. The collectors coerce these into `crate::types`.

mod lenient;
mod messages;
mod rpc;

pub use lenient::*;
pub use messages::*;
pub use rpc::*;
