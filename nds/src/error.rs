//! Error taxonomy surfaced to the CLI.
//!
//! Operations return `anyhow::Result`; these variants are attached at the point
//! of failure so `main` can pick an exit code via `downcast_ref`.

use thiserror::Error;

use crate::core::types::JobExit;

#[derive(Debug, Error)]
pub enum NdsError {
    /// Invalid combination of options, e.g. a throughput run with one stream.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A required binary or build artifact is absent.
    #[error("prerequisite missing: {0}")]
    PrerequisiteMissing(String),

    /// A spawned process returned a non-zero status.
    #[error("`{command}` failed with {status}")]
    ExternalToolFailure { command: String, status: JobExit },

    /// At least one stream of a throughput run failed.
    #[error("{} stream(s) failed: {}", .0.len(), .0.join(", "))]
    StreamsFailed(Vec<String>),
}
