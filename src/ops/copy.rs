//! File copy through an external copier, and the audited (log-only) variant.
//!
//! ## Backends
//!
//! Copiers disagree on both argument layout and exit codes, so each
//! [`CopyBackend`] owns both:
//!
//! | Backend    | Arguments                       | Copied | Nothing copied | Failed |
//! |------------|---------------------------------|--------|----------------|--------|
//! | `cp`       | `input out_dir`                 | 0      | —              | ≠ 0    |
//! | `xcopy`    | `input out_dir`                 | 0      | —              | ≠ 0    |
//! | `robocopy` | `input_dir out_dir file_name`   | 1      | 0              | other  |
//!
//! Robocopy's exit code is a bit field; `1` means "one or more files were
//! copied" and `0` means "nothing to do". We copy exactly one file, so only
//! those two codes are mapped; nothing is inferred for multi-file copies.

use crate::config::ToolConfig;
use crate::error::{DocToolsError, ToolKind};
use crate::ops::Attempt;
use crate::output::Outcome;
use crate::pipeline::command::{Invocation, ToolTemplate};
use crate::pipeline::dirs::ensure_dir;
use crate::pipeline::guard::{check_overwrite, GuardDecision};
use crate::request::{base_name, ConversionRequest};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// A supported copy tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyBackend {
    Cp,
    Xcopy,
    Robocopy,
}

/// How a copier's exit code reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    Copied,
    /// Clean exit, but no file was copied. Treated as an error.
    NothingCopied,
    Failed,
}

impl CopyBackend {
    /// `robocopy` on Windows, `cp` elsewhere.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            CopyBackend::Robocopy
        } else {
            CopyBackend::Cp
        }
    }

    /// `xcopy` on Windows, `cp` elsewhere.
    pub fn platform_audit_default() -> Self {
        if cfg!(windows) {
            CopyBackend::Xcopy
        } else {
            CopyBackend::Cp
        }
    }

    /// The executable name looked up on `PATH` when none is configured.
    pub fn default_program(self) -> &'static str {
        match self {
            CopyBackend::Cp => "cp",
            CopyBackend::Xcopy => "xcopy",
            CopyBackend::Robocopy => "robocopy",
        }
    }

    /// Per-call arguments for copying `input` into `out_dir`.
    pub fn arguments(self, input: &Path, out_dir: &Path) -> Vec<OsString> {
        match self {
            CopyBackend::Cp | CopyBackend::Xcopy => {
                vec![input.as_os_str().to_os_string(), out_dir.as_os_str().to_os_string()]
            }
            CopyBackend::Robocopy => {
                let dir = match input.parent() {
                    Some(p) if !p.as_os_str().is_empty() => p.as_os_str().to_os_string(),
                    _ => OsString::from("."),
                };
                vec![dir, out_dir.as_os_str().to_os_string(), base_name(input)]
            }
        }
    }

    /// Map an exit code (`None` = killed by a signal) to a copy status.
    pub fn interpret(self, code: Option<i32>) -> CopyStatus {
        match (self, code) {
            (CopyBackend::Cp | CopyBackend::Xcopy, Some(0)) => CopyStatus::Copied,
            (CopyBackend::Robocopy, Some(1)) => CopyStatus::Copied,
            (CopyBackend::Robocopy, Some(0)) => CopyStatus::NothingCopied,
            _ => CopyStatus::Failed,
        }
    }
}

impl fmt::Display for CopyBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_program())
    }
}

impl std::str::FromStr for CopyBackend {
    type Err = DocToolsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cp" => Ok(CopyBackend::Cp),
            "xcopy" => Ok(CopyBackend::Xcopy),
            "robocopy" => Ok(CopyBackend::Robocopy),
            other => Err(DocToolsError::InvalidConfig(format!(
                "Unknown copy backend '{other}' (expected cp, xcopy or robocopy)"
            ))),
        }
    }
}

/// A copy backend and the executable that implements it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyTool {
    pub backend: CopyBackend,
    pub program: String,
}

impl From<CopyBackend> for CopyTool {
    fn from(backend: CopyBackend) -> Self {
        Self {
            backend,
            program: backend.default_program().to_string(),
        }
    }
}

impl CopyTool {
    pub fn new(backend: CopyBackend, program: impl Into<String>) -> Self {
        Self {
            backend,
            program: program.into(),
        }
    }

    /// The full command for copying `input` into `out_dir`.
    pub fn invocation(&self, input: &Path, out_dir: &Path) -> Invocation {
        ToolTemplate::new(self.program.clone(), Vec::<String>::new())
            .invocation(self.backend.arguments(input, out_dir))
    }
}

/// Copy `req.input` into `req.out_dir` with the configured copier.
///
/// The destination is `out_dir/<input file name>`; `req.out_name` is ignored.
///
/// # Errors
/// - [`DocToolsError::CreateDir`] — the output directory could not be made
/// - [`DocToolsError::Exec`] — the copier could not start, timed out or was cancelled
/// - [`DocToolsError::NoFilesCopied`] — robocopy reported nothing copied
/// - [`DocToolsError::ToolFailed`] — any other failing exit code
pub async fn copy_file(
    config: &ToolConfig,
    req: &ConversionRequest,
) -> Result<Outcome, DocToolsError> {
    let dest = req.out_dir_with_input_name();
    if check_overwrite(&dest, req.overwrite).await == GuardDecision::Skip {
        return Ok(Outcome::Skipped(dest));
    }
    ensure_dir(&req.out_dir).await?;

    let tool = config.copy_tool();
    let attempt = Attempt::new(
        ToolKind::FileCopier,
        &req.input,
        &req.out_dir,
        tool.invocation(&req.input, &req.out_dir),
    );
    info!("Copying {} → {}", req.input.display(), req.out_dir.display());

    let done = attempt.run(&req.exec_options(config)).await?;
    match tool.backend.interpret(done.code()) {
        CopyStatus::Copied => Ok(Outcome::Written(dest)),
        CopyStatus::NothingCopied => {
            warn!("{} copied nothing for {}", tool.backend, req.input.display());
            Err(DocToolsError::NoFilesCopied {
                input: req.input.clone(),
                output: req.out_dir.clone(),
                command: attempt.command_line(),
            })
        }
        CopyStatus::Failed => Err(attempt.failed(&done)),
    }
}

/// Record the copy command for `req` in `log` instead of running it.
///
/// Writes one line: the audit copier's command line with spaced tokens
/// quoted. The overwrite guard and directory creation still apply, so the
/// log only lists copies that are actually pending.
///
/// # Errors
/// - [`DocToolsError::CreateDir`] — the output directory could not be made
/// - [`DocToolsError::LogWriteFailed`] — the sink rejected the line
pub async fn copy_file_logged<W: Write + ?Sized>(
    config: &ToolConfig,
    req: &ConversionRequest,
    log: &mut W,
) -> Result<Outcome, DocToolsError> {
    let dest = req.out_dir_with_input_name();
    if check_overwrite(&dest, req.overwrite).await == GuardDecision::Skip {
        return Ok(Outcome::Skipped(dest));
    }
    ensure_dir(&req.out_dir).await?;

    let line = config
        .audit_copy_tool()
        .invocation(&req.input, &req.out_dir)
        .command_line();
    writeln!(log, "{line}").map_err(|source| DocToolsError::LogWriteFailed { source })?;
    Ok(Outcome::Logged(dest))
}
