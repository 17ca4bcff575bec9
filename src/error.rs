//! Error types for the doctools library.
//!
//! Two error types reflect two layers:
//!
//! * [`ExecError`] — the bounded executor could not produce a normal exit
//!   status (the tool never started, overran its deadline, was cancelled, or
//!   its status could not be collected). It knows nothing about files.
//!
//! * [`DocToolsError`] — **Fatal** errors returned by the facade operations.
//!   Every tool-related variant carries the tool, the input, the output
//!   target and the full command line so an operator can diagnose the
//!   failure without re-running it.
//!
//! Text extraction failures and "converter produced nothing" are *not*
//! errors: they are reported as [`crate::output::Outcome::NoOutput`].

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Which configured tool an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    TextExtractor,
    ImageConverter,
    DocumentConverter,
    FileCopier,
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ToolKind::TextExtractor => "text extractor",
            ToolKind::ImageConverter => "image converter",
            ToolKind::DocumentConverter => "document converter",
            ToolKind::FileCopier => "file copier",
        })
    }
}

/// Why a bounded run ended without a usable exit status.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The child process could not be launched (missing executable,
    /// permission denied, …). Reported immediately; no deadline was armed.
    #[error("could not start process: {0}")]
    Start(#[source] std::io::Error),

    /// The process outlived its deadline and its process group was killed.
    #[error("timed out after {}s and was killed", .after.as_secs_f64())]
    TimedOut { after: Duration },

    /// The caller's cancellation token fired; the process group was killed.
    #[error("cancelled and killed")]
    Cancelled,

    /// Waiting on the child or reading its pipes failed.
    #[error("failed while waiting for process: {0}")]
    Wait(#[source] std::io::Error),
}

/// All fatal errors returned by the doctools library.
#[derive(Debug, Error)]
pub enum DocToolsError {
    // ── Tool execution ────────────────────────────────────────────────────
    /// The tool could not start, timed out, was cancelled, or could not be waited on.
    #[error("{tool} failed on '{input}' → '{output}'\nCommand: {command}\nError: {source}")]
    Exec {
        tool: ToolKind,
        input: PathBuf,
        output: PathBuf,
        command: String,
        #[source]
        source: ExecError,
    },

    /// The tool ran to completion and reported failure.
    #[error("{tool} failed on '{input}' → '{output}'\nCommand: {command}\nError: {status}{}", stderr_suffix(.stderr))]
    ToolFailed {
        tool: ToolKind,
        input: PathBuf,
        output: PathBuf,
        command: String,
        status: String,
        stderr: String,
    },

    /// The copier exited cleanly but reported that nothing was copied.
    #[error("Error copying '{input}' to '{output}'\nCommand: {command}\nError: no errors occurred and no files were copied")]
    NoFilesCopied {
        input: PathBuf,
        output: PathBuf,
        command: String,
    },

    // ── File system ───────────────────────────────────────────────────────
    /// Could not create the output directory (or a file is in the way).
    #[error("Error making directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write the extracted text.
    #[error("Error writing to '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The converter produced no output and the output directory could not
    /// be removed either.
    #[error("Can't create '{output}', can't delete '{dir}': {missing}, {source}")]
    CleanupFailed {
        output: PathBuf,
        dir: PathBuf,
        missing: std::io::Error,
        #[source]
        source: std::io::Error,
    },

    /// The audit log sink rejected the copy record.
    #[error("Failed to write copy record to log: {source}")]
    LogWriteFailed {
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocToolsError {
    /// True if the tool was killed for overrunning its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            DocToolsError::Exec {
                source: ExecError::TimedOut { .. },
                ..
            }
        )
    }

    /// True if the tool was killed because the request was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            DocToolsError::Exec {
                source: ExecError::Cancelled,
                ..
            }
        )
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\nStderr: {trimmed}")
    }
}
