//! Cutover configuration
//!
//! Deserialized from a TOML file; every section carries working defaults
//! matching the stock deployment so a missing or partial file still yields
//! a runnable configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level cutover configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutoverConfig {
    /// Live artifact being patched
    pub artifact_path: PathBuf,
    /// Backup slot path; defaults to the sibling `<artifact>.bak`
    pub backup_path: Option<PathBuf>,
    /// The single managed key replaced in place
    pub managed_key: String,
    /// Append-only audit record store
    pub audit_log_path: PathBuf,
    /// Managed service section
    pub service: ServiceConfig,
    /// Catalog section
    pub catalog: CatalogConfig,
    /// Status file section
    pub status: StatusConfig,
}

impl CutoverConfig {
    /// Create the default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns `ConfigError` when the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Effective backup path: explicit, or the sibling `.bak`
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        match &self.backup_path {
            Some(path) => path.clone(),
            None => {
                let mut backup = self.artifact_path.clone().into_os_string();
                backup.push(".bak");
                PathBuf::from(backup)
            }
        }
    }

    /// With a different artifact path
    #[inline]
    #[must_use]
    pub fn with_artifact_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_path = path.into();
        self
    }

    /// With a different managed key
    #[inline]
    #[must_use]
    pub fn with_managed_key(mut self, key: impl Into<String>) -> Self {
        self.managed_key = key.into();
        self
    }
}

impl Default for CutoverConfig {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from("/opt/docker/beammp-server/compose.yml"),
            backup_path: None,
            managed_key: "BEAMMP_MAP".to_string(),
            audit_log_path: PathBuf::from("/opt/docker/beammp-server/cutover-audit.jsonl"),
            service: ServiceConfig::default(),
            catalog: CatalogConfig::default(),
            status: StatusConfig::default(),
        }
    }
}

/// Managed service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Directory holding the compose file
    pub compose_dir: PathBuf,
    /// Container name checked against the running set
    pub container_name: String,
    /// Bound on each runtime command, in seconds
    pub command_timeout_secs: u64,
}

impl ServiceConfig {
    /// Per-command timeout as a `Duration`
    #[inline]
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            compose_dir: PathBuf::from("/opt/docker/beammp-server"),
            container_name: "beammp-server".to_string(),
            command_timeout_secs: 120,
        }
    }
}

/// Catalog refresh configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// URL serving the catalog JSON
    pub url: String,
    /// Refresh period, in seconds
    pub refresh_interval_secs: u64,
    /// Bound on each fetch, in seconds
    pub fetch_timeout_secs: u64,
}

impl CatalogConfig {
    /// Refresh period as a `Duration`
    #[inline]
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Fetch bound as a `Duration`
    #[inline]
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            refresh_interval_secs: 300,
            fetch_timeout_secs: 5,
        }
    }
}

/// Read-only status file configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Structured status file written by the managed service
    pub path: PathBuf,
    /// Table holding the active value
    pub table: String,
    /// Key holding the active value
    pub key: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/opt/docker/beammp-server/ServerConfig.toml"),
            table: "General".to_string(),
            key: "Map".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_backup_is_sibling_bak() {
        let config = CutoverConfig::new().with_artifact_path("/srv/game/compose.yml");
        assert_eq!(
            config.backup_path(),
            PathBuf::from("/srv/game/compose.yml.bak")
        );
    }

    #[test]
    fn explicit_backup_path_wins() {
        let mut config = CutoverConfig::new();
        config.backup_path = Some(PathBuf::from("/backups/compose.yml"));
        assert_eq!(config.backup_path(), PathBuf::from("/backups/compose.yml"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: CutoverConfig = toml::from_str(
            r#"
            artifact_path = "/srv/game/compose.yml"
            managed_key = "GAME_MAP"

            [service]
            container_name = "game"
            "#,
        )
        .unwrap();

        assert_eq!(config.artifact_path, PathBuf::from("/srv/game/compose.yml"));
        assert_eq!(config.managed_key, "GAME_MAP");
        assert_eq!(config.service.container_name, "game");
        // Untouched sections keep their defaults.
        assert_eq!(config.service.command_timeout_secs, 120);
        assert_eq!(config.catalog.refresh_interval_secs, 300);
        assert_eq!(config.status.table, "General");
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let result = CutoverConfig::load("/nonexistent/cutover.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn load_invalid_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cutover.toml");
        std::fs::write(&path, "artifact_path = [not toml").unwrap();
        assert!(matches!(
            CutoverConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
