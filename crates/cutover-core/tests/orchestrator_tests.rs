//! End-to-end mutation workflow tests
//!
//! Exercise the orchestrator over real temp-dir artifacts with scripted
//! service controllers, checking exact on-disk bytes, audit records, and
//! the mutual-exclusion contract.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;

use cutover_core::{
    AuditRecord, ChangeRequest, CutoverConfig, JsonlAuditLog, MutationOrchestrator, Outcome,
};
use cutover_runtime::{RuntimeError, ServiceController, ServiceState};

const ORIGINAL: &str = "services:\n  beammp:\n    environment:\n      \
                        - BEAMMP_MAP=/levels/east_coast_usa/info.json\n";

/// Controller that reports a fixed health and optionally stalls in stop()
struct ScriptedController {
    healthy: AtomicBool,
    stop_delay: Option<Duration>,
    restarts: AtomicUsize,
}

impl ScriptedController {
    fn new(healthy: bool) -> Self {
        Self {
            healthy: AtomicBool::new(healthy),
            stop_delay: None,
            restarts: AtomicUsize::new(0),
        }
    }

    fn with_stop_delay(mut self, delay: Duration) -> Self {
        self.stop_delay = Some(delay);
        self
    }
}

#[async_trait]
impl ServiceController for ScriptedController {
    async fn stop(&self) -> Result<(), RuntimeError> {
        if let Some(delay) = self.stop_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn start(&self) -> Result<(), RuntimeError> {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn state(&self) -> ServiceState {
        if self.healthy.load(Ordering::SeqCst) {
            ServiceState::Running
        } else {
            ServiceState::Stopped
        }
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    artifact: PathBuf,
    audit_log: PathBuf,
    orchestrator: MutationOrchestrator,
    controller: Arc<ScriptedController>,
}

async fn fixture(controller: ScriptedController) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let artifact = dir.path().join("compose.yml");
    let audit_log = dir.path().join("audit.jsonl");
    tokio::fs::write(&artifact, ORIGINAL).await.unwrap();

    let mut config = CutoverConfig::new().with_artifact_path(&artifact);
    config.audit_log_path = audit_log.clone();

    let controller = Arc::new(controller);
    let audit = Arc::new(JsonlAuditLog::new(&audit_log));
    let orchestrator = MutationOrchestrator::new(config, controller.clone(), audit);

    Fixture {
        _dir: dir,
        artifact,
        audit_log,
        orchestrator,
        controller,
    }
}

async fn read_audit(path: &PathBuf) -> Vec<AuditRecord> {
    let raw = tokio::fs::read_to_string(path).await.unwrap();
    raw.lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn end_to_end_map_switch() {
    let fx = fixture(ScriptedController::new(true)).await;
    let requested_at = Utc.with_ymd_and_hms(2026, 8, 27, 12, 0, 0).unwrap();

    let outcome = fx
        .orchestrator
        .apply_change(ChangeRequest::new(
            "/levels/west_coast_usa/info.json",
            "alice",
            requested_at,
        ))
        .outcome()
        .await;
    assert_eq!(outcome, Outcome::Succeeded);

    // The managed line carries the new value, the actor, and the fixed
    // timestamp format, with the original list-marker prefix intact.
    let patched = tokio::fs::read_to_string(&fx.artifact).await.unwrap();
    assert_eq!(
        patched,
        "services:\n  beammp:\n    environment:\n      \
         - BEAMMP_MAP=/levels/west_coast_usa/info.json  \
         # Updated by alice on 2026-08-27 12:00:00\n"
    );

    // The backup at the sibling path equals the pre-attempt artifact.
    let mut backup_path = fx.artifact.clone().into_os_string();
    backup_path.push(".bak");
    let backup = tokio::fs::read_to_string(PathBuf::from(backup_path))
        .await
        .unwrap();
    assert_eq!(backup, ORIGINAL);

    let records = read_audit(&fx.audit_log).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, "succeeded");
    assert_eq!(records[0].actor, "alice");
    assert_eq!(records[0].new_value, "/levels/west_coast_usa/info.json");
    assert_eq!(
        records[0].old_value.as_deref(),
        Some("/levels/east_coast_usa/info.json")
    );
    assert_eq!(records[0].requested_at, requested_at);
}

#[tokio::test]
async fn forced_unhealthy_rolls_back_to_original_bytes() {
    let fx = fixture(ScriptedController::new(false)).await;

    let outcome = fx
        .orchestrator
        .apply_change(ChangeRequest::now("/levels/west_coast_usa/info.json", "bob"))
        .outcome()
        .await;

    match &outcome {
        Outcome::RolledBack { reason } => {
            assert!(reason.contains("beammp-server"));
            assert!(reason.contains("previous configuration restored"));
        }
        other => panic!("expected RolledBack, got {other:?}"),
    }

    assert_eq!(
        tokio::fs::read_to_string(&fx.artifact).await.unwrap(),
        ORIGINAL
    );
    // Mutation restart plus rollback restart.
    assert_eq!(fx.controller.restarts.load(Ordering::SeqCst), 2);

    let records = read_audit(&fx.audit_log).await;
    assert_eq!(records[0].outcome, "rolled_back");
    assert_eq!(records[0].phase, "rolled_back");
}

#[tokio::test]
async fn second_caller_gets_busy_while_first_runs() {
    let fx = fixture(
        ScriptedController::new(true).with_stop_delay(Duration::from_millis(250)),
    )
    .await;

    let first = fx
        .orchestrator
        .apply_change(ChangeRequest::now("/levels/a/info.json", "alice"));
    let second = fx
        .orchestrator
        .apply_change(ChangeRequest::now("/levels/b/info.json", "bob"));

    let busy = tokio::time::timeout(Duration::from_millis(50), second.outcome())
        .await
        .expect("Busy must resolve without waiting for the running mutation");
    assert_eq!(busy, Outcome::Busy);

    assert_eq!(first.outcome().await, Outcome::Succeeded);

    // Busy attempts never mutate the artifact or the audit log.
    let patched = tokio::fs::read_to_string(&fx.artifact).await.unwrap();
    assert!(patched.contains("BEAMMP_MAP=/levels/a/info.json"));
    assert_eq!(read_audit(&fx.audit_log).await.len(), 1);
}

#[tokio::test]
async fn sequential_mutations_reuse_the_lock() {
    let fx = fixture(ScriptedController::new(true)).await;

    for value in ["/levels/a/info.json", "/levels/b/info.json"] {
        let outcome = fx
            .orchestrator
            .apply_change(ChangeRequest::now(value, "alice"))
            .outcome()
            .await;
        assert_eq!(outcome, Outcome::Succeeded);
    }

    let patched = tokio::fs::read_to_string(&fx.artifact).await.unwrap();
    assert!(patched.contains("BEAMMP_MAP=/levels/b/info.json"));
    assert_eq!(read_audit(&fx.audit_log).await.len(), 2);
}

#[tokio::test]
async fn unhealthy_service_before_mutation_still_proceeds() {
    // No precondition health check: fixing an unhealthy service is exactly
    // what the operation is for. The controller stays unhealthy, so this
    // lands in rollback rather than being rejected up front.
    let fx = fixture(ScriptedController::new(false)).await;

    let outcome = fx
        .orchestrator
        .apply_change(ChangeRequest::now("/levels/fix/info.json", "alice"))
        .outcome()
        .await;

    assert!(matches!(outcome, Outcome::RolledBack { .. }));
    assert!(fx.controller.restarts.load(Ordering::SeqCst) > 0);
}
