//! Cutover Artifact - config document patching and backup
//!
//! The artifact layer of the cutover workspace:
//! - Line-oriented in-memory representation of the managed config file
//! - Single-key in-place patching that preserves surrounding formatting
//! - Single-slot point-in-time backup used as the rollback recovery point
//!
//! # Example
//!
//! ```rust,ignore
//! use cutover_artifact::{ConfigDocument, change_annotation};
//! use chrono::Utc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut doc = ConfigDocument::load("compose.yml").await?;
//! let note = change_annotation("alice", Utc::now());
//! if doc.patch_key("BEAMMP_MAP", "/levels/west_coast_usa/info.json", &note) {
//!     doc.save().await?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod backup;
pub mod document;
pub mod error;

// Re-exports for convenience
pub use backup::BackupSlot;
pub use document::{change_annotation, ConfigDocument, ANNOTATION_TIME_FORMAT};
pub use error::ArtifactError;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
