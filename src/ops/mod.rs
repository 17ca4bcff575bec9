//! The operation facade: extract text, thumbnail, copy, convert to PDF.
//!
//! Every operation follows the same skeleton and differs only in how it
//! reads the tool's result:
//!
//! ```text
//! guard ──▶ ensure_dir ──▶ build invocation ──▶ run_bounded ──▶ interpret
//! ```
//!
//! | Operation | Tool failure is… |
//! |-----------|------------------|
//! | [`extract_text`]   | tolerated: `Ok(Outcome::NoOutput)` |
//! | [`thumbnail`]      | an error |
//! | [`copy_file`]      | decided by the copy backend's exit-code table |
//! | [`convert_to_pdf`] | irrelevant: only the output file's existence counts |
//!
//! Operations are `async` and each awaits exactly one child process. There is
//! no internal queue: run several operations on separate tasks to convert in
//! parallel. Synchronous callers can use [`run_sync`].

pub mod copy;
pub mod pdf;
pub mod text;
pub mod thumbnail;

pub use copy::{copy_file, copy_file_logged, CopyBackend, CopyStatus, CopyTool};
pub use pdf::{convert_to_pdf, pdf_output_path};
pub use text::extract_text;
pub use thumbnail::thumbnail;

use crate::error::{DocToolsError, ToolKind};
use crate::pipeline::command::Invocation;
use crate::pipeline::exec::{run_bounded, Completion, ExecOptions};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Drive one operation to completion on a private current-thread runtime.
///
/// For callers without a tokio runtime. Must not be called from inside one.
///
/// ```rust,no_run
/// use doctools::{ops, ConversionRequest, ToolConfig};
///
/// let config = ToolConfig::default();
/// let req = ConversionRequest::new("in/minutes.doc", "out/minutes");
/// let outcome = ops::run_sync(ops::convert_to_pdf(&config, &req)).unwrap();
/// println!("{:?}", outcome.path());
/// ```
pub fn run_sync<F, T>(op: F) -> Result<T, DocToolsError>
where
    F: Future<Output = Result<T, DocToolsError>>,
{
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| DocToolsError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(op)
}

/// One tool run with everything needed to report it.
pub(crate) struct Attempt {
    tool: ToolKind,
    input: PathBuf,
    output: PathBuf,
    invocation: Invocation,
}

impl Attempt {
    pub(crate) fn new(tool: ToolKind, input: &Path, output: &Path, invocation: Invocation) -> Self {
        Self {
            tool,
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            invocation,
        }
    }

    pub(crate) fn command_line(&self) -> String {
        self.invocation.command_line()
    }

    /// Run the invocation; executor failures become [`DocToolsError::Exec`].
    pub(crate) async fn run(&self, opts: &ExecOptions) -> Result<Completion, DocToolsError> {
        debug!("{}: {}", self.tool, self.invocation);
        run_bounded(&self.invocation, opts)
            .await
            .map_err(|source| DocToolsError::Exec {
                tool: self.tool,
                input: self.input.clone(),
                output: self.output.clone(),
                command: self.command_line(),
                source,
            })
    }

    /// The error for a run that completed with a failing status.
    pub(crate) fn failed(&self, done: &Completion) -> DocToolsError {
        DocToolsError::ToolFailed {
            tool: self.tool,
            input: self.input.clone(),
            output: self.output.clone(),
            command: self.command_line(),
            status: done.status.to_string(),
            stderr: done.stderr_tail.clone(),
        }
    }
}
