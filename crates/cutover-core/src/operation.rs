//! Mutation operation lifecycle
//!
//! One `Operation` per `apply_change` call, moving through a strictly
//! sequential phase machine with a single rollback edge:
//!
//! ```text
//! Pending -> BackingUp -> Patching -> Restarting -> Verifying
//!     -> { Succeeded | RollingBack -> RolledBack } | Failed
//! ```
//!
//! `Failed` is reachable directly from `BackingUp` and `Patching` (nothing
//! live was touched yet). `RollingBack` is reached only from `Verifying`.
//! The operation itself is never persisted; only its audit record is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use ulid::Ulid;

/// Unique operation identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OperationId(pub Ulid);

impl OperationId {
    /// Generate new operation ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One requested configuration change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    /// Value the managed key should take
    pub new_value: String,
    /// Actor identity, trusted as given, used for audit only
    pub actor: String,
    /// When the caller issued the request
    pub requested_at: DateTime<Utc>,
}

impl ChangeRequest {
    /// Create a request with an explicit timestamp
    #[inline]
    #[must_use]
    pub fn new(
        new_value: impl Into<String>,
        actor: impl Into<String>,
        requested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            new_value: new_value.into(),
            actor: actor.into(),
            requested_at,
        }
    }

    /// Create a request stamped with the current time
    #[inline]
    #[must_use]
    pub fn now(new_value: impl Into<String>, actor: impl Into<String>) -> Self {
        Self::new(new_value, actor, Utc::now())
    }
}

/// Phase of a mutation operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationPhase {
    /// Created, lock not yet held
    Pending,
    /// Snapshotting the live artifact
    BackingUp,
    /// Loading, patching, and saving the document
    Patching,
    /// Stopping and starting the service
    Restarting,
    /// Checking post-restart health
    Verifying,
    /// Restoring the backup and restarting again
    RollingBack,
    /// Terminal: the change took effect
    Succeeded,
    /// Terminal: the artifact is back to its prior content
    RolledBack,
    /// Terminal: aborted before any live-state mutation stuck
    Failed,
}

impl OperationPhase {
    /// Whether the phase ends the operation
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::RolledBack | Self::Failed)
    }

    /// Whether `next` is a legal successor of this phase
    #[must_use]
    pub fn may_precede(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::BackingUp)
                | (Self::BackingUp, Self::Patching)
                | (Self::BackingUp, Self::Failed)
                | (Self::Patching, Self::Restarting)
                | (Self::Patching, Self::Failed)
                | (Self::Restarting, Self::Verifying)
                | (Self::Verifying, Self::Succeeded)
                | (Self::Verifying, Self::RollingBack)
                | (Self::RollingBack, Self::RolledBack)
        )
    }

    /// Stable label for logs and audit records
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::BackingUp => "backing_up",
            Self::Patching => "patching",
            Self::Restarting => "restarting",
            Self::Verifying => "verifying",
            Self::RollingBack => "rolling_back",
            Self::Succeeded => "succeeded",
            Self::RolledBack => "rolled_back",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OperationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome delivered to the caller
///
/// Exactly one per `apply_change` call. `RolledBack` is a failure outcome
/// distinguished from `Failed` only by the fact that a restart was
/// attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The change took effect and the service came back healthy
    Succeeded,
    /// The attempt aborted before any live mutation stuck
    Failed {
        /// Displayable failure detail
        reason: String,
    },
    /// The artifact was restored to its prior content after a bad restart
    RolledBack {
        /// Displayable failure detail
        reason: String,
    },
    /// Another mutation already holds the artifact lock
    Busy,
}

impl Outcome {
    /// Whether the requested change is now in effect
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Stable label for logs and audit records
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed { .. } => "failed",
            Self::RolledBack { .. } => "rolled_back",
            Self::Busy => "busy",
        }
    }

    /// Failure detail, when the outcome carries one
    #[inline]
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Failed { reason } | Self::RolledBack { reason } => Some(reason),
            Self::Succeeded | Self::Busy => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "{}: {}", self.label(), reason),
            None => f.write_str(self.label()),
        }
    }
}

/// Mutable operation record driven by the orchestrator
#[derive(Debug, Clone)]
pub struct Operation {
    /// Operation identifier
    pub id: OperationId,
    /// The request that created this operation
    pub request: ChangeRequest,
    /// Current phase
    pub phase: OperationPhase,
    /// Best-effort pre-mutation value of the managed key
    pub old_value: Option<String>,
}

impl Operation {
    /// Create a pending operation for a request
    #[inline]
    #[must_use]
    pub fn new(id: OperationId, request: ChangeRequest) -> Self {
        Self {
            id,
            request,
            phase: OperationPhase::Pending,
            old_value: None,
        }
    }

    /// Advance to the next phase
    ///
    /// Transitions are validated in debug builds; the orchestrator is the
    /// only driver and never branches outside the machine.
    pub fn advance(&mut self, next: OperationPhase) {
        debug_assert!(
            self.phase.may_precede(next),
            "illegal phase transition {} -> {}",
            self.phase,
            next
        );
        tracing::debug!(operation = %self.id, from = %self.phase, to = %next, "phase transition");
        self.phase = next;
    }
}

/// Async-completion handle returned by `apply_change`
///
/// Yields exactly one terminal outcome. The caller acknowledges the request
/// immediately and surfaces the outcome later; the slow steps (restart,
/// health check) never block the interface layer.
#[derive(Debug)]
pub struct OperationHandle {
    id: OperationId,
    receiver: oneshot::Receiver<Outcome>,
}

impl OperationHandle {
    /// Pair a handle with its completion sender
    #[must_use]
    pub(crate) fn channel(id: OperationId) -> (oneshot::Sender<Outcome>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { id, receiver: rx })
    }

    /// Operation identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// Wait for the terminal outcome
    ///
    /// A dropped worker is reported as a failure rather than a hang.
    pub async fn outcome(self) -> Outcome {
        self.receiver.await.unwrap_or_else(|_| Outcome::Failed {
            reason: "operation worker dropped before reporting".to_string(),
        })
    }
}
