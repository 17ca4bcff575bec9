//! Thumbnail generation.

use crate::config::ToolConfig;
use crate::error::{DocToolsError, ToolKind};
use crate::ops::Attempt;
use crate::output::Outcome;
use crate::pipeline::dirs::ensure_dir;
use crate::pipeline::guard::{check_overwrite, GuardDecision};
use crate::request::ConversionRequest;
use std::ffi::OsString;
use tracing::info;

/// Render the first page/frame of `req.input` as a PNG bounded by the
/// configured thumbnail size.
///
/// The image converter receives `<input>[0]` (first frame only) followed by
/// the destination `out_dir/<name>.png`.
///
/// # Errors
/// - [`DocToolsError::CreateDir`] — the output directory could not be made
/// - [`DocToolsError::Exec`] — the converter could not start, timed out or was cancelled
/// - [`DocToolsError::ToolFailed`] — the converter exited non-zero
pub async fn thumbnail(
    config: &ToolConfig,
    req: &ConversionRequest,
) -> Result<Outcome, DocToolsError> {
    let dest = req.out_dir.join(req.output_name_or("png"));
    if check_overwrite(&dest, req.overwrite).await == GuardDecision::Skip {
        return Ok(Outcome::Skipped(dest));
    }
    ensure_dir(&req.out_dir).await?;

    let attempt = Attempt::new(
        ToolKind::ImageConverter,
        &req.input,
        &dest,
        config
            .thumbnail_template()
            .invocation([first_frame(req), dest.clone().into_os_string()]),
    );
    info!(
        "Thumbnail {} ({}) → {}",
        req.input.display(),
        config.thumb_geometry(),
        dest.display()
    );

    let done = attempt.run(&req.exec_options(config)).await?;
    if !done.success() {
        return Err(attempt.failed(&done));
    }
    Ok(Outcome::Written(dest))
}

/// ImageMagick frame selector: `input[0]`.
fn first_frame(req: &ConversionRequest) -> OsString {
    let mut token = req.input_token();
    token.push("[0]");
    token
}
