//! Current-value status reader
//!
//! Reads the currently active value from a separate structured status file
//! written by the managed service itself (for the stock deployment,
//! `ServerConfig.toml` table `General`, key `Map`). Display only: this
//! layer never mutates the status file.

use std::path::{Path, PathBuf};

use crate::config::StatusConfig;

/// Status file error
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    /// The status file could not be read
    #[error("failed to read status file {}: {source}", path.display())]
    Read {
        /// Status file path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The status file is not valid TOML
    #[error("failed to parse status file {}: {source}", path.display())]
    Parse {
        /// Status file path
        path: PathBuf,
        /// Underlying parse error
        source: toml::de::Error,
    },

    /// The configured table/key is absent or not a string
    #[error("status file has no string value at {table}.{key}")]
    MissingValue {
        /// Table that was searched
        table: String,
        /// Key that was searched
        key: String,
    },
}

/// Reader over one status file location
#[derive(Debug, Clone)]
pub struct StatusReader {
    path: PathBuf,
    table: String,
    key: String,
}

impl StatusReader {
    /// Create a reader for `table.key` in the file at `path`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, table: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            table: table.into(),
            key: key.into(),
        }
    }

    /// Create a reader from the status config section
    #[inline]
    #[must_use]
    pub fn from_config(config: &StatusConfig) -> Self {
        Self::new(&config.path, &config.table, &config.key)
    }

    /// Status file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the currently active value
    ///
    /// # Errors
    /// Returns `StatusError` when the file cannot be read or parsed, or the
    /// configured table/key holds no string value.
    pub fn read_current_value(&self) -> Result<String, StatusError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| StatusError::Read {
            path: self.path.clone(),
            source,
        })?;
        let value: toml::Value = toml::from_str(&raw).map_err(|source| StatusError::Parse {
            path: self.path.clone(),
            source,
        })?;

        value
            .get(&self.table)
            .and_then(|table| table.get(&self.key))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| StatusError::MissingValue {
                table: self.table.clone(),
                key: self.key.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_status(contents: &str) -> (tempfile::TempDir, StatusReader) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ServerConfig.toml");
        std::fs::write(&path, contents).unwrap();
        let reader = StatusReader::new(&path, "General", "Map");
        (dir, reader)
    }

    #[test]
    fn reads_active_value() {
        let (_dir, reader) = write_status(
            r#"
            [General]
            Name = "Test Server"
            Map = "/levels/east_coast_usa/info.json"
            "#,
        );
        assert_eq!(
            reader.read_current_value().unwrap(),
            "/levels/east_coast_usa/info.json"
        );
    }

    #[test]
    fn missing_key_is_missing_value() {
        let (_dir, reader) = write_status("[General]\nName = \"Test Server\"\n");
        assert!(matches!(
            reader.read_current_value(),
            Err(StatusError::MissingValue { .. })
        ));
    }

    #[test]
    fn non_string_value_is_missing_value() {
        let (_dir, reader) = write_status("[General]\nMap = 42\n");
        assert!(matches!(
            reader.read_current_value(),
            Err(StatusError::MissingValue { .. })
        ));
    }

    #[test]
    fn missing_file_is_read_error() {
        let reader = StatusReader::new("/nonexistent/ServerConfig.toml", "General", "Map");
        assert!(matches!(
            reader.read_current_value(),
            Err(StatusError::Read { .. })
        ));
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let (_dir, reader) = write_status("[General\nMap = ");
        assert!(matches!(
            reader.read_current_value(),
            Err(StatusError::Parse { .. })
        ));
    }
}
