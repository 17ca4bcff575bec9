//! Overwrite guard: skip work whose result is already on disk.
//!
//! The check and the tool's own write are not atomic. None of the wrapped
//! tools offers an exclusive-create mode, so a destination created between
//! the check and the write is overwritten. That window is accepted.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// What the guard decided for a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardDecision {
    /// Destination exists and overwrite was not requested.
    Skip,
    /// Go ahead and (re)create the destination.
    Proceed,
}

/// Decide whether to produce `dest`.
///
/// Returns [`GuardDecision::Skip`] only when `overwrite` is false and
/// something (file, directory, even a broken artefact) exists at `dest`.
/// An existence check that fails for other reasons (e.g. permission denied
/// on a parent) counts as "does not exist"; the tool will then report the
/// real problem.
pub async fn check_overwrite(dest: &Path, overwrite: bool) -> GuardDecision {
    if overwrite {
        return GuardDecision::Proceed;
    }
    match tokio::fs::try_exists(dest).await {
        Ok(true) => {
            debug!("Skipping, destination exists: {}", dest.display());
            GuardDecision::Skip
        }
        _ => GuardDecision::Proceed,
    }
}
