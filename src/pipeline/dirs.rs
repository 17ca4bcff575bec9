//! Output directory creation with a three-way result.

use crate::error::DocToolsError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Whether [`ensure_dir`] had to create anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirStatus {
    /// The directory (and possibly some ancestors) was created by this call.
    Created,
    /// A directory was already there.
    AlreadyExisted,
}

/// Create `dir` and any missing ancestors.
///
/// # Errors
/// [`DocToolsError::CreateDir`] when creation fails or a non-directory
/// occupies the path.
pub async fn ensure_dir(dir: &Path) -> Result<DirStatus, DocToolsError> {
    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => return Ok(DirStatus::AlreadyExisted),
        Ok(_) => {
            return Err(DocToolsError::CreateDir {
                path: dir.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "path exists and is not a directory",
                ),
            })
        }
        Err(_) => {}
    }

    match tokio::fs::create_dir_all(dir).await {
        Ok(()) => {
            debug!("Created directory {}", dir.display());
            Ok(DirStatus::Created)
        }
        // Lost a race with another creator; still fine.
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && dir.is_dir() => {
            Ok(DirStatus::AlreadyExisted)
        }
        Err(source) => Err(DocToolsError::CreateDir {
            path: dir.to_path_buf(),
            source,
        }),
    }
}
