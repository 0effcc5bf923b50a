//! Append-only audit log
//!
//! Every mutation attempt appends exactly one record at its terminal phase.
//! Records are never mutated or deleted by this layer. Audit writes must
//! never change an operation's outcome: the orchestrator isolates a failed
//! append to a `tracing::warn!` on the diagnostic channel.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::operation::{Operation, Outcome};

/// Immutable record of one terminal operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Operation identifier
    pub operation: String,
    /// Actor identity as supplied by the caller
    pub actor: String,
    /// Pre-mutation value, best effort
    pub old_value: Option<String>,
    /// Requested value
    pub new_value: String,
    /// When the caller issued the request
    pub requested_at: DateTime<Utc>,
    /// When the record was written
    pub recorded_at: DateTime<Utc>,
    /// Terminal phase label
    pub phase: String,
    /// Terminal outcome label
    pub outcome: String,
    /// Human-readable detail
    pub detail: String,
}

impl AuditRecord {
    /// Build the record for a terminal operation
    #[must_use]
    pub fn from_operation(op: &Operation, outcome: &Outcome) -> Self {
        Self {
            operation: op.id.to_string(),
            actor: op.request.actor.clone(),
            old_value: op.old_value.clone(),
            new_value: op.request.new_value.clone(),
            requested_at: op.request.requested_at,
            recorded_at: Utc::now(),
            phase: op.phase.as_str().to_string(),
            outcome: outcome.label().to_string(),
            detail: outcome
                .reason()
                .unwrap_or("configuration change applied")
                .to_string(),
        }
    }
}

/// Audit append error
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The record could not be serialized
    #[error("failed to encode audit record: {0}")]
    Encode(#[from] serde_json::Error),

    /// The store could not be appended to
    #[error("failed to append to audit log {}: {source}", path.display())]
    Append {
        /// Audit log path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// Append-only audit store seam
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one record to the durable store
    ///
    /// # Errors
    /// Returns `AuditError` when the write fails; callers isolate this and
    /// never let it alter the operation outcome.
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

/// Audit log appending one JSON line per record
#[derive(Debug, Clone)]
pub struct JsonlAuditLog {
    path: PathBuf,
}

impl JsonlAuditLog {
    /// Create a log writing to `path`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Audit log path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for JsonlAuditLog {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| AuditError::Append {
                path: self.path.clone(),
                source,
            })?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|source| AuditError::Append {
                path: self.path.clone(),
                source,
            })?;
        file.flush().await.map_err(|source| AuditError::Append {
            path: self.path.clone(),
            source,
        })
    }
}
