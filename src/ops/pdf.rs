//! Document to PDF conversion.
//!
//! LibreOffice's exit code does not say whether a PDF was written: it exits 0
//! on some failures and non-zero after some successful conversions. The only
//! trusted signal is the destination file existing afterwards.
//!
//! When no PDF appears the output directory is cleaned up according to
//! [`PdfCleanup`]. With the default policy the whole directory is removed,
//! so it must belong to this conversion alone.

use crate::config::{PdfCleanup, ToolConfig};
use crate::error::{DocToolsError, ToolKind};
use crate::ops::Attempt;
use crate::output::Outcome;
use crate::pipeline::dirs::{ensure_dir, DirStatus};
use crate::pipeline::guard::{check_overwrite, GuardDecision};
use crate::request::{base_name, ConversionRequest};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extensions replaced by `.pdf`. Anything else keeps its extension.
const WORD_EXTENSIONS: [&str; 4] = ["doc", "docx", "dotx", "docm"];

/// Where the converter writes the PDF for `input`.
///
/// A trailing `.doc`, `.docx`, `.dotx` or `.docm` is replaced by `.pdf`,
/// matched ASCII case-insensitively, so mixed case like `.Doc` counts too,
/// not just the all-lower and all-upper forms. Any other extension is
/// kept and `.pdf` appended. A name that is only an extension, like `.doc`,
/// has no stem and becomes `.doc.pdf`, not `.pdf`.
///
/// The name is built on raw `OsStr` bytes, so names that are not valid UTF-8
/// map to the file the converter actually writes.
///
/// ```rust
/// use doctools::pdf_output_path;
/// use std::path::{Path, PathBuf};
///
/// let out = Path::new("out");
/// assert_eq!(pdf_output_path(Path::new("a/Minutes.DOCX"), out), PathBuf::from("out/Minutes.pdf"));
/// assert_eq!(pdf_output_path(Path::new("a/sheet.xls"), out), PathBuf::from("out/sheet.xls.pdf"));
/// ```
pub fn pdf_output_path(input: &Path, out_dir: &Path) -> PathBuf {
    let file = Path::new(input.file_name().unwrap_or(input.as_os_str()));
    let is_word = file
        .extension()
        .is_some_and(|ext| WORD_EXTENSIONS.iter().any(|w| ext.eq_ignore_ascii_case(w)));
    let mut name = match file.file_stem() {
        Some(stem) if is_word => stem.to_os_string(),
        _ => base_name(input),
    };
    name.push(".pdf");
    out_dir.join(name)
}

/// Convert `req.input` to PDF inside `req.out_dir`.
///
/// `req.out_name` is ignored; the name comes from [`pdf_output_path`].
/// Returns `Ok(Outcome::NoOutput)` when the converter ran but no PDF exists.
///
/// # Errors
/// - [`DocToolsError::CreateDir`] — the output directory could not be made
/// - [`DocToolsError::Exec`] — the converter could not start, timed out or was
///   cancelled (cleanup is still attempted)
/// - [`DocToolsError::CleanupFailed`] — no PDF, and the directory could not be removed
pub async fn convert_to_pdf(
    config: &ToolConfig,
    req: &ConversionRequest,
) -> Result<Outcome, DocToolsError> {
    let dest = pdf_output_path(&req.input, &req.out_dir);
    if check_overwrite(&dest, req.overwrite).await == GuardDecision::Skip {
        return Ok(Outcome::Skipped(dest));
    }
    let dir_status = ensure_dir(&req.out_dir).await?;

    let attempt = Attempt::new(
        ToolKind::DocumentConverter,
        &req.input,
        &dest,
        config.pdf_template().invocation([
            req.out_dir.clone().into_os_string(),
            req.input_token(),
        ]),
    );
    info!("Converting to PDF: {}", req.input.display());

    let policy = config.pdf_cleanup();
    match attempt.run(&req.exec_options(config)).await {
        Ok(done) => {
            if !done.success() {
                debug!("Converter exited with {}; checking for output", done.status);
            }
        }
        Err(e) => {
            if let Err(rm) = clean_up(policy, &req.out_dir, dir_status).await {
                warn!("Could not remove {}: {}", req.out_dir.display(), rm);
            }
            return Err(e);
        }
    }

    match tokio::fs::metadata(&dest).await {
        Ok(_) => {
            info!("Wrote {}", dest.display());
            Ok(Outcome::Written(dest))
        }
        Err(missing) => {
            warn!("Converter produced no {}: {}", dest.display(), missing);
            match clean_up(policy, &req.out_dir, dir_status).await {
                Ok(()) => Ok(Outcome::NoOutput),
                Err(source) => Err(DocToolsError::CleanupFailed {
                    output: dest,
                    dir: req.out_dir.clone(),
                    missing,
                    source,
                }),
            }
        }
    }
}

async fn clean_up(policy: PdfCleanup, dir: &Path, status: DirStatus) -> std::io::Result<()> {
    let remove = match policy {
        PdfCleanup::RemoveOutputDir => true,
        PdfCleanup::RemoveIfCreated => status == DirStatus::Created,
        PdfCleanup::Keep => false,
    };
    if !remove {
        return Ok(());
    }
    debug!("Removing output directory {}", dir.display());
    match tokio::fs::remove_dir_all(dir).await {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
