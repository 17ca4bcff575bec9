//! # doctools
//!
//! Run third-party document tools (text extractors, image converters,
//! document-to-PDF converters, file copiers) as bounded child processes.
//!
//! ## Why this crate?
//!
//! Archival ingest pipelines lean on tools like Apache Tika, ImageMagick and
//! LibreOffice, and those tools hang on malformed input, fork helpers that
//! outlive them, and report success through inconsistent exit codes. This
//! crate wraps each tool in one operation with the same guarantees:
//! arguments are passed as tokens (no shell), every run has a deadline
//! after which the whole process group is killed, existing results are not
//! redone, and failures carry the exact command line that failed.
//!
//! ## Operation Overview
//!
//! ```text
//! ConversionRequest
//!  │
//!  ├─ 1. Guard    skip if the destination exists and overwrite is off
//!  ├─ 2. Dir      create the output directory
//!  ├─ 3. Build    tool template + input/output → token array
//!  ├─ 4. Run      spawn, race exit against the deadline, kill on overrun
//!  └─ 5. Judge    per-operation reading of the result → Outcome
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doctools::{convert_to_pdf, ConversionRequest, Outcome, ToolConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ToolConfig::builder()
//!         .libreoffice("/usr/bin/soffice")
//!         .timeout_secs(120)
//!         .build()?;
//!     let req = ConversionRequest::new("in/minutes.docx", "out/minutes");
//!     match convert_to_pdf(&config, &req).await? {
//!         Outcome::Written(pdf) => println!("wrote {}", pdf.display()),
//!         Outcome::Skipped(pdf) => println!("already have {}", pdf.display()),
//!         other => println!("no PDF: {:?}", other),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doctools` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! doctools = { version = "0.1", default-features = false }
//! ```
//!
//! ## Format Classification
//!
//! The PRONOM identifier tables used to route files to an operation live in
//! the [`puid_formats`] crate, re-exported here.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod ops;
pub mod output;
pub mod pipeline;
pub mod request;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PdfCleanup, ToolConfig, ToolConfigBuilder};
pub use error::{DocToolsError, ExecError, ToolKind};
pub use ops::{
    convert_to_pdf, copy_file, copy_file_logged, extract_text, pdf_output_path, run_sync,
    thumbnail, CopyBackend, CopyStatus, CopyTool,
};
pub use output::Outcome;
pub use pipeline::command::{quote_path, Invocation, ToolTemplate};
pub use pipeline::dirs::DirStatus;
pub use pipeline::guard::GuardDecision;
pub use request::ConversionRequest;

pub use puid_formats;
