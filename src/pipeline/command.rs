//! Command construction: tool templates, invocations and path quoting.
//!
//! ## Token arrays, never shell strings
//!
//! An [`Invocation`] is handed to the OS as a program plus discrete argument
//! tokens. Nothing is joined and re-split, so a path like
//! `/records/Board Minutes; rm -rf ~.doc` reaches the tool byte-for-byte and
//! no shell ever sees it.
//!
//! The joined form still exists for humans: [`Invocation::command_line`]
//! renders the tokens with [`quote_path`] applied, which is what goes into
//! error messages and the audited-copy log.

use crate::error::DocToolsError;
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Wrap `path` in double quotes if it contains a space.
///
/// Paths that already start with `"` are returned unchanged, which makes the
/// function idempotent: `quote_path(&quote_path(p)) == quote_path(p)`.
pub fn quote_path(path: &str) -> String {
    if path.starts_with('"') {
        return path.to_string();
    }
    if path.contains(' ') {
        return format!("\"{path}\"");
    }
    path.to_string()
}

/// An executable followed by its fixed flags.
///
/// Built once from configuration and shared read-only by every invocation of
/// that tool; cloning only bumps a reference count.
#[derive(Clone, PartialEq, Eq)]
pub struct ToolTemplate {
    tokens: Arc<[String]>,
}

impl ToolTemplate {
    /// Create a template from an executable and its fixed flags.
    pub fn new<I, S>(program: impl Into<String>, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = std::iter::once(program.into())
            .chain(flags.into_iter().map(Into::into))
            .collect();
        Self {
            tokens: tokens.into(),
        }
    }

    /// Create a template from a full token list (program first).
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self, DocToolsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        match tokens.first() {
            None => Err(DocToolsError::InvalidConfig(
                "tool template must name an executable".into(),
            )),
            Some(p) if p.is_empty() => Err(DocToolsError::InvalidConfig(
                "tool template executable is empty".into(),
            )),
            Some(_) => Ok(Self {
                tokens: tokens.into(),
            }),
        }
    }

    /// The executable.
    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    /// Program followed by fixed flags.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Build an invocation: template tokens, then `trailing` in order.
    pub fn invocation<I, S>(&self, trailing: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let args = self.tokens[1..]
            .iter()
            .map(OsString::from)
            .chain(trailing.into_iter().map(Into::into))
            .collect();
        Invocation {
            program: OsString::from(self.program()),
            args,
        }
    }
}

impl fmt::Debug for ToolTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tokens.iter()).finish()
    }
}

impl fmt::Display for ToolTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line: Vec<String> = self.tokens.iter().map(|t| quote_path(t)).collect();
        f.write_str(&line.join(" "))
    }
}

/// A fully resolved command: program plus ordered argument tokens.
///
/// Fields are private; an invocation is never modified after it is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: OsString,
    args: Vec<OsString>,
}

impl Invocation {
    pub fn program(&self) -> &OsString {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Program followed by arguments, as lossy UTF-8 strings.
    pub fn tokens(&self) -> Vec<String> {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|t| t.to_string_lossy().into_owned())
            .collect()
    }

    /// Space-joined, quoted rendering for logs and error messages.
    ///
    /// Not suitable for re-parsing by a shell: only spaces are handled.
    pub fn command_line(&self) -> String {
        self.tokens()
            .iter()
            .map(|t| quote_path(t))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// A `tokio` command ready to spawn. Stdio and process-group setup are
    /// left to the executor.
    pub fn to_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Lossy UTF-8 view of a path, used when a path must become a template token.
pub(crate) fn path_token(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
