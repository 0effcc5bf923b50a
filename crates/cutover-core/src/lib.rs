//! Cutover Core - configuration mutation orchestration
//!
//! The state machine that switches a single active configuration value of
//! a running service and restarts it safely:
//! - Backs up the config artifact before any live write
//! - Patches the managed key in place, preserving formatting
//! - Restarts the managed service and verifies it came back healthy
//! - Rolls back to the prior artifact and service state on failure
//! - Appends an auditable record for every attempt
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cutover_core::{ChangeRequest, CutoverConfig, JsonlAuditLog, MutationOrchestrator};
//! use cutover_runtime::ComposeController;
//!
//! # async fn example() {
//! let config = CutoverConfig::load("cutover.toml").unwrap();
//! let controller = Arc::new(ComposeController::new(
//!     &config.service.compose_dir,
//!     &config.service.container_name,
//! ));
//! let audit = Arc::new(JsonlAuditLog::new(&config.audit_log_path));
//! let orchestrator = MutationOrchestrator::new(config, controller, audit);
//!
//! let handle = orchestrator.apply_change(ChangeRequest::now(
//!     "/levels/west_coast_usa/info.json",
//!     "alice",
//! ));
//! println!("outcome: {}", handle.outcome().await);
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod audit;
pub mod catalog;
pub mod config;
pub mod error;
pub mod operation;
pub mod orchestrator;
pub mod status;

// Re-exports for convenience
pub use audit::{AuditError, AuditRecord, AuditSink, JsonlAuditLog};
pub use catalog::{
    spawn_refresher, Catalog, CatalogEntry, CatalogError, CatalogSource, CatalogStore,
    HttpCatalogSource,
};
pub use config::{CatalogConfig, CutoverConfig, ServiceConfig, StatusConfig};
pub use error::{ConfigError, MutationError};
pub use operation::{
    ChangeRequest, Operation, OperationHandle, OperationId, OperationPhase, Outcome,
};
pub use orchestrator::MutationOrchestrator;
pub use status::{StatusError, StatusReader};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Cutover Core
    pub use crate::{
        ChangeRequest, CutoverConfig, JsonlAuditLog, MutationOrchestrator, OperationHandle,
        Outcome, StatusReader,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
