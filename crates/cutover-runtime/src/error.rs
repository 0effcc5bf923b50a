//! Error types for service control
//!
//! Covers the ways an external runtime command can fail: it cannot be
//! spawned, it exits non-zero, or it outlives its bounded timeout. An
//! unhealthy service is not an error; `ServiceController::is_healthy`
//! reports it as a plain `false`.

use std::process::ExitStatus;

/// Service runtime command error
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The command could not be spawned at all
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        /// Rendered command line
        command: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The command ran and exited with a failure status
    #[error("`{command}` exited with {status}: {stderr}")]
    Command {
        /// Rendered command line
        command: String,
        /// Exit status reported by the runtime
        status: ExitStatus,
        /// Captured stderr, trimmed
        stderr: String,
    },

    /// The command did not finish within the bounded timeout
    #[error("`{command}` timed out after {timeout_secs}s")]
    Timeout {
        /// Rendered command line
        command: String,
        /// Timeout that expired
        timeout_secs: u64,
    },
}
