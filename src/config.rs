//! Tool configuration.
//!
//! Every operation reads its tool templates, thumbnail geometry, timeout and
//! copy backend from a [`ToolConfig`]. The config is built once through
//! [`ToolConfigBuilder`], validated, and then never changes: operations take
//! it by reference and callers that run conversions on several tasks share it
//! behind an `Arc`. There is no process-wide mutable state.
//!
//! # Example
//! ```rust
//! use doctools::ToolConfig;
//! use std::time::Duration;
//!
//! let config = ToolConfig::builder()
//!     .tika_jar("/opt/tika/tika-app.jar")
//!     .thumb(320, 240)
//!     .timeout(Duration::from_secs(60))
//!     .build()
//!     .unwrap();
//! assert_eq!(config.thumb_geometry(), "320x240");
//! ```

use crate::error::DocToolsError;
use crate::ops::copy::{CopyBackend, CopyTool};
use crate::pipeline::command::{path_token, ToolTemplate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default per-tool timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default thumbnail bounding box, in pixels.
pub const DEFAULT_THUMB: (u32, u32) = (1024, 1024);

#[cfg(windows)]
mod defaults {
    pub const TIKA_JAR: &str = r"C:\apache_tika\tika-app-1.5.jar";
    pub const IMAGEMAGICK: &str = r"C:\Program Files\ImageMagick-6.8.8-Q16\convert.exe";
    pub const LIBREOFFICE: &str = r"C:\Program Files\LibreOffice 5\program\soffice";
}

#[cfg(not(windows))]
mod defaults {
    pub const TIKA_JAR: &str = "/usr/share/java/tika-app.jar";
    pub const IMAGEMAGICK: &str = "convert";
    pub const LIBREOFFICE: &str = "soffice";
}

/// What [`crate::ops::convert_to_pdf`] does with the output directory when
/// the converter produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfCleanup {
    /// Delete the whole output directory, whether or not this call created it.
    ///
    /// The output directory must be owned exclusively by the conversion:
    /// anything else in it is deleted too. (default)
    #[default]
    RemoveOutputDir,
    /// Delete the output directory only if this call created it.
    RemoveIfCreated,
    /// Leave the output directory alone.
    Keep,
}

/// Immutable configuration shared by all operations.
///
/// Built via [`ToolConfig::builder()`] or [`ToolConfig::default()`].
#[derive(Debug, Clone)]
pub struct ToolConfig {
    extract: ToolTemplate,
    thumbnail: ToolTemplate,
    pdf: ToolTemplate,
    transcode: Option<ToolTemplate>,
    thumb: (u32, u32),
    timeout: Duration,
    copy: CopyTool,
    audit_copy: CopyTool,
    pdf_cleanup: PdfCleanup,
}

impl Default for ToolConfig {
    fn default() -> Self {
        ToolConfigBuilder::default().assemble()
    }
}

impl ToolConfig {
    /// Create a new builder for `ToolConfig`.
    pub fn builder() -> ToolConfigBuilder {
        ToolConfigBuilder::default()
    }

    /// Text extractor: `java -jar <tika> -t`, or the override.
    pub fn extract_template(&self) -> &ToolTemplate {
        &self.extract
    }

    /// Image converter: `<convert> -resize WxH -flatten -quality 100`, or the override.
    pub fn thumbnail_template(&self) -> &ToolTemplate {
        &self.thumbnail
    }

    /// Document converter: `<soffice> --headless --convert-to pdf:writer_pdf_Export --outdir`,
    /// or the override.
    pub fn pdf_template(&self) -> &ToolTemplate {
        &self.pdf
    }

    /// Media transcoder, when one is configured.
    pub fn transcode_template(&self) -> Option<&ToolTemplate> {
        self.transcode.as_ref()
    }

    /// Thumbnail bounding box as `(width, height)`.
    pub fn thumb_dimensions(&self) -> (u32, u32) {
        self.thumb
    }

    /// Thumbnail bounding box in ImageMagick geometry form, e.g. `1024x1024`.
    pub fn thumb_geometry(&self) -> String {
        format!("{}x{}", self.thumb.0, self.thumb.1)
    }

    /// Default deadline for every tool run. A request may override it.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Copier used by [`crate::ops::copy_file`].
    pub fn copy_tool(&self) -> &CopyTool {
        &self.copy
    }

    /// Copier whose command line [`crate::ops::copy_file_logged`] records.
    pub fn audit_copy_tool(&self) -> &CopyTool {
        &self.audit_copy
    }

    pub fn pdf_cleanup(&self) -> PdfCleanup {
        self.pdf_cleanup
    }
}

/// Builder for [`ToolConfig`].
#[derive(Debug, Clone)]
pub struct ToolConfigBuilder {
    java: String,
    tika_jar: PathBuf,
    imagemagick: PathBuf,
    libreoffice: PathBuf,
    ffmpeg: Option<PathBuf>,
    thumb: (u32, u32),
    timeout: Duration,
    copy: CopyTool,
    audit_copy: CopyTool,
    pdf_cleanup: PdfCleanup,
    extract_override: Option<ToolTemplate>,
    thumbnail_override: Option<ToolTemplate>,
    pdf_override: Option<ToolTemplate>,
}

impl Default for ToolConfigBuilder {
    fn default() -> Self {
        Self {
            java: "java".to_string(),
            tika_jar: PathBuf::from(defaults::TIKA_JAR),
            imagemagick: PathBuf::from(defaults::IMAGEMAGICK),
            libreoffice: PathBuf::from(defaults::LIBREOFFICE),
            ffmpeg: None,
            thumb: DEFAULT_THUMB,
            timeout: DEFAULT_TIMEOUT,
            copy: CopyTool::from(CopyBackend::platform_default()),
            audit_copy: CopyTool::from(CopyBackend::platform_audit_default()),
            pdf_cleanup: PdfCleanup::default(),
            extract_override: None,
            thumbnail_override: None,
            pdf_override: None,
        }
    }
}

impl ToolConfigBuilder {
    /// Java launcher used to run Tika. Default: `java` from `PATH`.
    pub fn java(mut self, java: impl Into<String>) -> Self {
        self.java = java.into();
        self
    }

    /// Location of the Tika app jar.
    pub fn tika_jar(mut self, path: impl Into<PathBuf>) -> Self {
        self.tika_jar = path.into();
        self
    }

    /// ImageMagick `convert` (or `magick`) executable.
    pub fn imagemagick(mut self, path: impl Into<PathBuf>) -> Self {
        self.imagemagick = path.into();
        self
    }

    /// LibreOffice `soffice` executable.
    pub fn libreoffice(mut self, path: impl Into<PathBuf>) -> Self {
        self.libreoffice = path.into();
        self
    }

    /// FFmpeg executable. Not configured by default.
    pub fn ffmpeg(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg = Some(path.into());
        self
    }

    /// Thumbnail bounding box in pixels. Both values must be positive.
    pub fn thumb(mut self, width: u32, height: u32) -> Self {
        self.thumb = (width, height);
        self
    }

    /// Default deadline for each tool run. Must be positive.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout_secs(self, secs: u64) -> Self {
        self.timeout(Duration::from_secs(secs))
    }

    pub fn copy_tool(mut self, tool: CopyTool) -> Self {
        self.copy = tool;
        self
    }

    pub fn audit_copy_tool(mut self, tool: CopyTool) -> Self {
        self.audit_copy = tool;
        self
    }

    pub fn pdf_cleanup(mut self, policy: PdfCleanup) -> Self {
        self.pdf_cleanup = policy;
        self
    }

    /// Replace the whole text-extractor template (e.g. `pdftotext -layout`).
    /// The input path is appended; the tool must write text to stdout.
    pub fn extract_template(mut self, template: ToolTemplate) -> Self {
        self.extract_override = Some(template);
        self
    }

    /// Replace the whole image-converter template. `input[0]` and the
    /// destination are appended; `thumb` is then only informational.
    pub fn thumbnail_template(mut self, template: ToolTemplate) -> Self {
        self.thumbnail_override = Some(template);
        self
    }

    /// Replace the whole document-converter template. The output directory
    /// and the input are appended, in that order.
    pub fn pdf_template(mut self, template: ToolTemplate) -> Self {
        self.pdf_override = Some(template);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ToolConfig, DocToolsError> {
        let (w, h) = self.thumb;
        if w == 0 || h == 0 {
            return Err(DocToolsError::InvalidConfig(format!(
                "Thumbnail dimensions must be positive, got {w}x{h}"
            )));
        }
        if self.timeout.is_zero() {
            return Err(DocToolsError::InvalidConfig(
                "Timeout must be greater than zero".into(),
            ));
        }
        if self.java.is_empty() {
            return Err(DocToolsError::InvalidConfig("Java launcher is empty".into()));
        }
        for (name, path) in [
            ("ImageMagick", &self.imagemagick),
            ("LibreOffice", &self.libreoffice),
        ] {
            if path.as_os_str().is_empty() {
                return Err(DocToolsError::InvalidConfig(format!("{name} path is empty")));
            }
        }
        for tool in [&self.copy, &self.audit_copy] {
            if tool.program.is_empty() {
                return Err(DocToolsError::InvalidConfig(format!(
                    "{} program is empty",
                    tool.backend
                )));
            }
        }
        Ok(self.assemble())
    }

    fn assemble(self) -> ToolConfig {
        let geometry = format!("{}x{}", self.thumb.0, self.thumb.1);
        let extract = self.extract_override.unwrap_or_else(|| {
            ToolTemplate::new(
                self.java.clone(),
                ["-jar".to_string(), path_token(&self.tika_jar), "-t".to_string()],
            )
        });
        let thumbnail = self.thumbnail_override.unwrap_or_else(|| {
            ToolTemplate::new(
                path_token(&self.imagemagick),
                ["-resize", geometry.as_str(), "-flatten", "-quality", "100"],
            )
        });
        let pdf = self.pdf_override.unwrap_or_else(|| {
            ToolTemplate::new(
                path_token(&self.libreoffice),
                ["--headless", "--convert-to", "pdf:writer_pdf_Export", "--outdir"],
            )
        });
        let transcode = self
            .ffmpeg
            .as_deref()
            .map(|p| ToolTemplate::new(path_token(p), Vec::<String>::new()));

        ToolConfig {
            extract,
            thumbnail,
            pdf,
            transcode,
            thumb: self.thumb,
            timeout: self.timeout,
            copy: self.copy,
            audit_copy: self.audit_copy,
            pdf_cleanup: self.pdf_cleanup,
        }
    }
}
