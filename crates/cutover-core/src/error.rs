//! Error types for Cutover Core
//!
//! Taxonomy of the mutation workflow:
//! - Artifact I/O failures (backup, load, save)
//! - Service runtime command failures
//! - Patch target absent in the artifact
//! - Concurrent mutation rejected
//!
//! An unhealthy post-restart service is deliberately not an error type; it
//! is reported as the `RolledBack` outcome.

use std::path::PathBuf;

use cutover_artifact::ArtifactError;
use cutover_runtime::RuntimeError;

/// Main mutation error type
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    /// Artifact or backup read/write failed
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// Service stop/start command failed
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// The managed key is absent from the artifact
    #[error("key `{key}` not found in {}", artifact.display())]
    KeyNotFound {
        /// The managed key
        key: String,
        /// The artifact that was scanned
        artifact: PathBuf,
    },

    /// Another mutation already holds the artifact lock
    #[error("a mutation is already in flight for {}", .0.display())]
    Busy(PathBuf),
}

impl MutationError {
    /// Whether the artifact was left untouched by this failure
    ///
    /// Backup, load, save-not-reached, and lock rejections all abort before
    /// any live-state mutation sticks.
    #[inline]
    #[must_use]
    pub fn artifact_untouched(&self) -> bool {
        matches!(
            self,
            Self::Artifact(_) | Self::KeyNotFound { .. } | Self::Busy(_)
        )
    }
}

/// Configuration file error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The config file is not valid TOML
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        /// Config file path
        path: PathBuf,
        /// Underlying parse error
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_not_found_display_names_key_and_artifact() {
        let err = MutationError::KeyNotFound {
            key: "BEAMMP_MAP".to_string(),
            artifact: PathBuf::from("/opt/docker/game/compose.yml"),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("BEAMMP_MAP"));
        assert!(rendered.contains("compose.yml"));
    }

    #[test]
    fn untouched_classification() {
        let busy = MutationError::Busy(PathBuf::from("/tmp/compose.yml"));
        assert!(busy.artifact_untouched());

        let not_found = MutationError::KeyNotFound {
            key: "KEY".to_string(),
            artifact: PathBuf::from("/tmp/compose.yml"),
        };
        assert!(not_found.artifact_untouched());
    }
}
