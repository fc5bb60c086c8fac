//! Stable exit codes for `nds` commands.

use crate::error::NdsError;

/// Every launched job succeeded.
pub const OK: i32 = 0;
/// An external tool or at least one stream reported a non-zero status.
pub const FAILED: i32 = 1;
/// Invalid configuration, missing prerequisites, or unreadable inputs.
pub const INVALID: i32 = 2;

/// Map a top-level error to the process exit code.
pub fn for_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<NdsError>() {
        Some(NdsError::ExternalToolFailure { .. } | NdsError::StreamsFailed(_)) => FAILED,
        Some(NdsError::Configuration(_) | NdsError::PrerequisiteMissing(_)) => INVALID,
        None => INVALID,
    }
}
