//! Service controller seam
//!
//! The orchestrator drives the managed service exclusively through this
//! trait, which keeps the mutation workflow testable with scripted
//! controllers and keeps the container runtime at arm's length.

use async_trait::async_trait;

use crate::error::RuntimeError;

/// Observed state of the managed service
///
/// Queried live from the process runtime by name match; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceState {
    /// The service appears in the running set
    Running,
    /// The runtime answered and the service is absent
    Stopped,
    /// The runtime could not be queried
    Unknown,
}

impl ServiceState {
    /// Stable label for logs and audit detail
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Start/stop/health-check of the managed service
///
/// `stop` and `start` are idempotent at the orchestration level: invoking
/// them with the service already in the target state is safe, and any
/// runtime-level error is surfaced rather than swallowed.
#[async_trait]
pub trait ServiceController: Send + Sync {
    /// Issue the stop command as a blocking external call
    ///
    /// # Errors
    /// Returns `RuntimeError` when the command fails or times out.
    async fn stop(&self) -> Result<(), RuntimeError>;

    /// Issue the start command as a blocking external call
    ///
    /// # Errors
    /// Returns `RuntimeError` when the command fails or times out.
    async fn start(&self) -> Result<(), RuntimeError>;

    /// Observe the current service state from the runtime
    async fn state(&self) -> ServiceState;

    /// Shallow health check: present in the running set
    ///
    /// `false` is not an error; it is the signal that drives rollback.
    async fn is_healthy(&self) -> bool {
        self.state().await == ServiceState::Running
    }
}
