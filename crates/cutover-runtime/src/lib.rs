//! Cutover Runtime - managed service control
//!
//! Wraps start/stop/health-check of the managed service process:
//! - `ServiceController` trait at the orchestration seam
//! - `ComposeController` backed by `docker compose` on the host
//! - `ServiceState` observed live from the runtime, never stored
//!
//! Health is deliberately shallow: the service counts as healthy when its
//! container name appears in the running set. The service's own startup is
//! opaque to this layer, and the shallow check bounds restart latency.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod compose;
pub mod controller;
pub mod error;

// Re-exports for convenience
pub use compose::ComposeController;
pub use controller::{ServiceController, ServiceState};
pub use error::RuntimeError;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
