//! snippet-relay library crate.
//!
//! Runs the background coordinator that owns the pending captured text and
//! relays save requests to a WordPress snippet store, plus the capture hook
//! and the local HTTP bridge used by UI surfaces.

pub mod bridge;
pub mod capture;
pub mod config;
pub mod coordinator;
pub mod credentials;
pub mod error;
pub mod logging;

#[cfg(test)]
pub(crate) mod test_support;

pub use capture::CaptureHook;
pub use config::RelayConfig;
pub use coordinator::{Coordinator, CoordinatorConfig, CoordinatorHandle, Request, Response};
pub use error::{Error, Result};
