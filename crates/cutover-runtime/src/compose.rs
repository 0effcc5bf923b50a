//! docker-compose backed service controller
//!
//! Drives the managed service unit with `docker compose down` / `docker
//! compose up -d` in its compose directory, and observes health by listing
//! running container names. Every external call runs under a bounded
//! timeout; expiry surfaces as that call's failure.

use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::controller::{ServiceController, ServiceState};
use crate::error::RuntimeError;

/// Default bound on each runtime command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Service controller backed by `docker compose`
#[derive(Debug, Clone)]
pub struct ComposeController {
    /// Directory holding the compose file
    compose_dir: PathBuf,
    /// Container name checked against the running set
    container_name: String,
    /// Bound applied to each external call
    command_timeout: Duration,
}

impl ComposeController {
    /// Create a controller for one compose project
    #[inline]
    #[must_use]
    pub fn new(compose_dir: impl Into<PathBuf>, container_name: impl Into<String>) -> Self {
        Self {
            compose_dir: compose_dir.into(),
            container_name: container_name.into(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// With a custom per-command timeout
    #[inline]
    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Container name this controller watches
    #[inline]
    #[must_use]
    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    /// Run one runtime command to completion under the timeout
    async fn run(&self, args: &[&str]) -> Result<Output, RuntimeError> {
        let rendered = format!("docker {}", args.join(" "));
        tracing::debug!(command = %rendered, "running runtime command");

        let output = tokio::time::timeout(
            self.command_timeout,
            Command::new("docker")
                .args(args)
                .current_dir(&self.compose_dir)
                .output(),
        )
        .await
        .map_err(|_| RuntimeError::Timeout {
            command: rendered.clone(),
            timeout_secs: self.command_timeout.as_secs(),
        })?
        .map_err(|source| RuntimeError::Spawn {
            command: rendered.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(RuntimeError::Command {
                command: rendered,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl ServiceController for ComposeController {
    async fn stop(&self) -> Result<(), RuntimeError> {
        self.run(&["compose", "down"]).await.map(|_| ())
    }

    async fn start(&self) -> Result<(), RuntimeError> {
        self.run(&["compose", "up", "-d"]).await.map(|_| ())
    }

    async fn state(&self) -> ServiceState {
        match self.run(&["ps", "--format", "{{.Names}}"]).await {
            Ok(output) => {
                let listing = String::from_utf8_lossy(&output.stdout);
                if listing_contains(&listing, &self.container_name) {
                    ServiceState::Running
                } else {
                    ServiceState::Stopped
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "container listing failed");
                ServiceState::Unknown
            }
        }
    }
}

/// Check a `docker ps --format '{{.Names}}'` listing for the managed name
///
/// Matches by substring, mirroring compose's habit of decorating container
/// names with project prefixes and replica suffixes.
fn listing_contains(listing: &str, container_name: &str) -> bool {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .any(|line| line.contains(container_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_matches_exact_name() {
        assert!(listing_contains("beammp-server\n", "beammp-server"));
    }

    #[test]
    fn listing_matches_decorated_name() {
        let listing = "proxy\ngame-beammp-server-1\n";
        assert!(listing_contains(listing, "beammp-server"));
    }

    #[test]
    fn listing_ignores_other_containers() {
        let listing = "proxy\npostgres\n";
        assert!(!listing_contains(listing, "beammp-server"));
    }

    #[test]
    fn empty_listing_is_absent() {
        assert!(!listing_contains("", "beammp-server"));
        assert!(!listing_contains("\n \n", "beammp-server"));
    }

    #[tokio::test]
    async fn builder_sets_timeout() {
        let controller = ComposeController::new("/opt/docker/game", "game")
            .with_command_timeout(Duration::from_secs(5));
        assert_eq!(controller.command_timeout, Duration::from_secs(5));
        assert_eq!(controller.container_name(), "game");
    }
}
