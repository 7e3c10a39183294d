//! Local HTTP bridge.
//!
//! Lets UI surfaces running in other processes reach the single coordinator:
//! `POST /message` carries one [`Request`](crate::coordinator::Request) and
//! returns its reply, `GET /health` reports liveness.
//! Only loopback hosts and extension origins are served.

pub mod error;
pub mod guard;
pub mod routes;
pub mod server;

pub use error::{BridgeError, BridgeResult};
pub use guard::RequestGuard;
pub use routes::HealthResponse;
pub use server::{BridgeConfig, BridgeServer, BridgeState, DEFAULT_BRIDGE_PORT};
