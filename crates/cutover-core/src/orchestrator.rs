//! Mutation orchestrator
//!
//! Composes the artifact, backup, runtime, and audit layers into the
//! guarded patch -> restart -> verify -> (rollback) workflow:
//!
//! 1. Try-acquire the per-artifact lock; contention resolves `Busy` at once
//! 2. Snapshot the live artifact
//! 3. Load, patch, and save the document
//! 4. Stop then start the service (command failures absorbed)
//! 5. Verify health; unhealthy restores the backup and restarts again
//! 6. Append the audit record, isolated from the outcome
//! 7. Release the lock and deliver the outcome on the completion channel
//!
//! The workflow runs on a spawned task so the slow steps never block the
//! caller, and nothing is cancellable once the backup completed: a live
//! write runs to a terminal state, rollback path included.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use cutover_artifact::{change_annotation, BackupSlot, ConfigDocument};
use cutover_runtime::{RuntimeError, ServiceController};

use crate::audit::{AuditRecord, AuditSink};
use crate::config::CutoverConfig;
use crate::error::MutationError;
use crate::operation::{
    ChangeRequest, Operation, OperationHandle, OperationId, OperationPhase, Outcome,
};

/// Drives the guarded mutation workflow for one artifact
pub struct MutationOrchestrator {
    /// Everything one attempt needs, cloned into its worker
    worker: OperationWorker,
    /// Per-artifact non-reentrant locks; at most one operation in flight
    /// per artifact path
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl MutationOrchestrator {
    /// Create an orchestrator over the given collaborators
    #[must_use]
    pub fn new(
        config: CutoverConfig,
        controller: Arc<dyn ServiceController>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            worker: OperationWorker {
                artifact_path: config.artifact_path.clone(),
                backup_path: config.backup_path(),
                managed_key: config.managed_key.clone(),
                container_name: config.service.container_name.clone(),
                controller,
                audit,
            },
            locks: DashMap::new(),
        }
    }

    /// Run the full workflow for one change request
    ///
    /// Returns immediately with a handle; the terminal outcome arrives on
    /// the handle once the workflow reaches a terminal phase. A request
    /// arriving while another mutation holds the artifact lock resolves
    /// `Busy` without queueing: the restart step has unbounded external
    /// latency and silent queueing would hide operator intent.
    pub fn apply_change(&self, request: ChangeRequest) -> OperationHandle {
        let id = OperationId::new();
        let (tx, handle) = OperationHandle::channel(id);
        let artifact = self.worker.artifact_path.clone();

        let lock = {
            let entry = self
                .locks
                .entry(artifact.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())));
            Arc::clone(entry.value())
        };
        let guard = match lock.try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::warn!(
                    operation = %id,
                    artifact = %artifact.display(),
                    "mutation already in flight, rejecting"
                );
                let _ = tx.send(Outcome::Busy);
                return handle;
            }
        };

        let worker = self.worker.clone();
        tokio::spawn(async move {
            let outcome = worker.run(id, request).await;
            // Lock held through audit append; released before the caller
            // can observe the outcome.
            drop(guard);
            let _ = tx.send(outcome);
        });
        handle
    }

    /// The artifact this orchestrator mutates
    #[inline]
    #[must_use]
    pub fn artifact_path(&self) -> &std::path::Path {
        &self.worker.artifact_path
    }
}

/// One attempt's collaborators and settings
#[derive(Clone)]
struct OperationWorker {
    artifact_path: PathBuf,
    backup_path: PathBuf,
    managed_key: String,
    container_name: String,
    controller: Arc<dyn ServiceController>,
    audit: Arc<dyn AuditSink>,
}

impl OperationWorker {
    /// Drive one operation to a terminal phase and audit it
    async fn run(&self, id: OperationId, request: ChangeRequest) -> Outcome {
        let mut op = Operation::new(id, request);
        tracing::info!(
            operation = %op.id,
            actor = %op.request.actor,
            new_value = %op.request.new_value,
            "mutation started"
        );

        let outcome = match self.execute(&mut op).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(operation = %op.id, error = %err, "mutation failed");
                op.advance(OperationPhase::Failed);
                Outcome::Failed {
                    reason: err.to_string(),
                }
            }
        };

        let record = AuditRecord::from_operation(&op, &outcome);
        if let Err(err) = self.audit.append(&record).await {
            // Audit failures are diagnostic-only, never the outcome.
            tracing::warn!(operation = %op.id, error = %err, "audit append failed");
        }

        tracing::info!(operation = %op.id, outcome = %outcome, "mutation finished");
        outcome
    }

    /// The phase machine proper
    ///
    /// `Err` means the attempt aborted before any live mutation stuck and
    /// maps to `Failed`; `Ok` carries `Succeeded` or `RolledBack`.
    async fn execute(&self, op: &mut Operation) -> Result<Outcome, MutationError> {
        let slot = BackupSlot::new(&self.artifact_path, &self.backup_path);

        // A backup must exist and be byte-identical to the pre-mutation
        // artifact before any write to the live artifact is allowed.
        op.advance(OperationPhase::BackingUp);
        slot.snapshot().await?;

        op.advance(OperationPhase::Patching);
        let mut doc = ConfigDocument::load(&self.artifact_path).await?;
        op.old_value = doc.value_of(&self.managed_key).map(str::to_string);
        let annotation = change_annotation(&op.request.actor, op.request.requested_at);
        if !doc.patch_key(&self.managed_key, &op.request.new_value, &annotation) {
            return Err(MutationError::KeyNotFound {
                key: self.managed_key.clone(),
                artifact: self.artifact_path.clone(),
            });
        }
        // Point of no return for the live artifact.
        doc.save().await?;

        // Command failures are absorbed here: a failing stop/start and an
        // unhealthy service are observationally the same failure, and the
        // health check is the authoritative judge.
        op.advance(OperationPhase::Restarting);
        if let Err(err) = self.restart().await {
            tracing::warn!(
                operation = %op.id,
                error = %err,
                "restart command failed, proceeding to verification"
            );
        }

        op.advance(OperationPhase::Verifying);
        if self.controller.is_healthy().await {
            op.advance(OperationPhase::Succeeded);
            return Ok(Outcome::Succeeded);
        }

        op.advance(OperationPhase::RollingBack);
        tracing::warn!(
            operation = %op.id,
            container = %self.container_name,
            "service unhealthy after restart, rolling back"
        );
        let mut reason = format!(
            "service `{}` not running after restart; previous configuration restored",
            self.container_name
        );
        if let Err(err) = slot.restore().await {
            tracing::error!(operation = %op.id, error = %err, "backup restore failed");
            reason = format!(
                "service `{}` not running after restart and restoring the backup failed: {err}",
                self.container_name
            );
        } else if let Err(err) = self.restart().await {
            // The terminal state stays RolledBack either way; the reason
            // records that the rollback restart also failed.
            tracing::warn!(operation = %op.id, error = %err, "rollback restart failed");
            reason.push_str(&format!("; rollback restart also failed: {err}"));
        }

        op.advance(OperationPhase::RolledBack);
        Ok(Outcome::RolledBack { reason })
    }

    /// Stop then start, attempting both even when stop fails
    async fn restart(&self) -> Result<(), RuntimeError> {
        let stopped = self.controller.stop().await;
        if let Err(err) = &stopped {
            tracing::warn!(error = %err, "stop command failed");
        }
        let started = self.controller.start().await;
        if let Err(err) = &started {
            tracing::warn!(error = %err, "start command failed");
        }
        stopped.and(started)
    }
}
