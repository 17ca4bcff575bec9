//! Operation outcomes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The non-error result of a facade operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "path", rename_all = "snake_case")]
pub enum Outcome {
    /// The tool ran and the destination now exists.
    Written(PathBuf),
    /// The destination already existed and overwrite was off; nothing ran.
    Skipped(PathBuf),
    /// The copy command was recorded in the audit log instead of executed.
    Logged(PathBuf),
    /// The tool failed softly (text extraction) or produced nothing (PDF).
    NoOutput,
}

impl Outcome {
    /// The destination path, if one exists or was recorded.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Outcome::Written(p) | Outcome::Skipped(p) | Outcome::Logged(p) => Some(p),
            Outcome::NoOutput => None,
        }
    }

    /// True if a tool actually ran and produced the destination.
    pub fn is_written(&self) -> bool {
        matches!(self, Outcome::Written(_))
    }
}
