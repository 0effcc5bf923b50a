//! Single-slot artifact backup
//!
//! A byte-identical copy of the live artifact at a fixed sibling path. The
//! slot holds exactly one snapshot: every new attempt overwrites it, and it
//! is copied back only during rollback. The orchestrator guarantees a
//! snapshot completes before any write to the live artifact.

use std::path::{Path, PathBuf};

use crate::error::ArtifactError;

/// File name suffix of the default sibling backup
const BACKUP_SUFFIX: &str = ".bak";

/// Single-slot backup of one live artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSlot {
    /// Path of the live artifact
    live: PathBuf,
    /// Path of the backup copy
    backup: PathBuf,
}

impl BackupSlot {
    /// Create a slot with explicit live and backup paths
    #[inline]
    #[must_use]
    pub fn new(live: impl Into<PathBuf>, backup: impl Into<PathBuf>) -> Self {
        Self {
            live: live.into(),
            backup: backup.into(),
        }
    }

    /// Create a slot whose backup sits beside the live artifact
    ///
    /// `compose.yml` backs up to `compose.yml.bak`.
    #[must_use]
    pub fn beside(live: impl Into<PathBuf>) -> Self {
        let live = live.into();
        let mut backup = live.clone().into_os_string();
        backup.push(BACKUP_SUFFIX);
        Self {
            live,
            backup: PathBuf::from(backup),
        }
    }

    /// Snapshot the live artifact into the slot
    ///
    /// Overwrites any prior backup; the slot is a recovery point, not a
    /// history.
    ///
    /// # Errors
    /// Returns `ArtifactError::Copy` if the copy fails.
    pub async fn snapshot(&self) -> Result<(), ArtifactError> {
        copy(&self.live, &self.backup).await
    }

    /// Restore the snapshot over the live artifact
    ///
    /// # Errors
    /// Returns `ArtifactError::Copy` if the copy fails.
    pub async fn restore(&self) -> Result<(), ArtifactError> {
        copy(&self.backup, &self.live).await
    }

    /// Path of the live artifact
    #[inline]
    #[must_use]
    pub fn live_path(&self) -> &Path {
        &self.live
    }

    /// Path of the backup copy
    #[inline]
    #[must_use]
    pub fn backup_path(&self) -> &Path {
        &self.backup
    }
}

async fn copy(from: &Path, to: &Path) -> Result<(), ArtifactError> {
    tokio::fs::copy(from, to)
        .await
        .map(|_| ())
        .map_err(|source| ArtifactError::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })
}
