//! Plain-text extraction.

use crate::config::ToolConfig;
use crate::error::{DocToolsError, ToolKind};
use crate::ops::Attempt;
use crate::output::Outcome;
use crate::pipeline::dirs::ensure_dir;
use crate::pipeline::guard::{check_overwrite, GuardDecision};
use crate::request::ConversionRequest;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Extract the text of `req.input` into `out_dir/<name>.txt`.
///
/// The extractor writes text to stdout; it is stored byte-for-byte. Text
/// extraction is best effort: if the extractor cannot start, exits non-zero,
/// times out or is cancelled, a warning is logged, nothing is written and
/// the result is `Ok(Outcome::NoOutput)`.
///
/// # Errors
/// - [`DocToolsError::CreateDir`] — the output directory could not be made
/// - [`DocToolsError::OutputWriteFailed`] — the text could not be stored
pub async fn extract_text(
    config: &ToolConfig,
    req: &ConversionRequest,
) -> Result<Outcome, DocToolsError> {
    let dest = req.out_dir.join(req.output_name_or("txt"));
    if check_overwrite(&dest, req.overwrite).await == GuardDecision::Skip {
        return Ok(Outcome::Skipped(dest));
    }
    ensure_dir(&req.out_dir).await?;

    let attempt = Attempt::new(
        ToolKind::TextExtractor,
        &req.input,
        &dest,
        config.extract_template().invocation([req.input_token()]),
    );
    info!("Extracting text: {}", req.input.display());

    let opts = req.exec_options(config).capture_stdout(true);
    let done = match attempt.run(&opts).await {
        Ok(done) => done,
        Err(e) => {
            warn!("{}", e);
            return Ok(Outcome::NoOutput);
        }
    };
    if !done.success() {
        warn!("{}", attempt.failed(&done));
        return Ok(Outcome::NoOutput);
    }

    write_atomic(&dest, &done.stdout).await?;
    info!("Wrote {} bytes of text to {}", done.stdout.len(), dest.display());
    Ok(Outcome::Written(dest))
}

/// Write to `<dest>.tmp`, then rename over `dest`.
async fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<(), DocToolsError> {
    let tmp = tmp_path(dest);
    let write_err = |source| DocToolsError::OutputWriteFailed {
        path: dest.to_path_buf(),
        source,
    };
    tokio::fs::write(&tmp, bytes).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp, dest).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(write_err(e));
    }
    Ok(())
}

fn tmp_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    dest.with_file_name(name)
}
