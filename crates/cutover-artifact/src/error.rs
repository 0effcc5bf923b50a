//! Error types for artifact I/O
//!
//! Covers read/write failures on the live artifact and copy failures on the
//! backup slot. Patch-target-absent is not an error here; `ConfigDocument`
//! reports it as a plain `false` so callers decide how fatal it is.

use std::path::PathBuf;

/// Artifact I/O error
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// Reading the artifact failed
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Path that could not be read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Writing the artifact failed
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// Path that could not be written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Copying between the live artifact and the backup slot failed
    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        /// Copy source
        from: PathBuf,
        /// Copy destination
        to: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_error_display_includes_path() {
        let err = ArtifactError::Read {
            path: PathBuf::from("/tmp/compose.yml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("/tmp/compose.yml"));
        assert!(rendered.contains("gone"));
    }
}
