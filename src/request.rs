//! Conversion requests.

use crate::config::ToolConfig;
use crate::pipeline::exec::ExecOptions;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Input to a single facade operation.
///
/// ```rust
/// use doctools::ConversionRequest;
/// use std::time::Duration;
///
/// let req = ConversionRequest::new("in/report.docx", "out/report")
///     .overwrite(true)
///     .timeout(Duration::from_secs(120));
/// assert_eq!(req.output_name_or("txt"), "report.txt");
/// ```
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub input: PathBuf,
    pub out_dir: PathBuf,
    /// Destination file name inside `out_dir`. Derived from the input when
    /// `None`. Ignored by copy and PDF conversion, whose names are fixed.
    pub out_name: Option<String>,
    /// Replace an existing destination instead of skipping.
    pub overwrite: bool,
    /// Overrides [`ToolConfig::timeout`] for this call only.
    pub timeout: Option<Duration>,
    /// Kills the tool when cancelled.
    pub cancel: Option<CancellationToken>,
}

impl ConversionRequest {
    pub fn new(input: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            out_dir: out_dir.into(),
            out_name: None,
            overwrite: false,
            timeout: None,
            cancel: None,
        }
    }

    pub fn out_name(mut self, name: impl Into<String>) -> Self {
        self.out_name = Some(name.into());
        self
    }

    pub fn overwrite(mut self, v: bool) -> Self {
        self.overwrite = v;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The explicit output name, or the input's file stem plus `.ext`.
    pub fn output_name_or(&self, ext: &str) -> String {
        match &self.out_name {
            Some(name) => name.clone(),
            None => {
                let stem = self
                    .input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "output".to_string());
                format!("{stem}.{ext}")
            }
        }
    }

    /// `out_dir` joined with the input's base name.
    pub(crate) fn out_dir_with_input_name(&self) -> PathBuf {
        match self.input.file_name() {
            Some(name) => self.out_dir.join(name),
            None => self.out_dir.clone(),
        }
    }

    /// Executor options: the request's timeout (else the config's) and token.
    pub(crate) fn exec_options(&self, config: &ToolConfig) -> ExecOptions {
        ExecOptions::new(self.timeout.unwrap_or_else(|| config.timeout()))
            .with_cancel(self.cancel.clone())
    }

    pub(crate) fn input_token(&self) -> OsString {
        self.input.clone().into_os_string()
    }
}

/// File name of `path`, or the whole path when it has none.
pub(crate) fn base_name(path: &Path) -> OsString {
    path.file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| path.as_os_str().to_os_string())
}
