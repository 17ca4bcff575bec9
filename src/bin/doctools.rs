//! CLI binary for doctools.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ToolConfig` / `ConversionRequest` and prints outcomes.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use doctools::puid_formats::{self, Family};
use doctools::{
    convert_to_pdf, copy_file, copy_file_logged, extract_text, thumbnail, ConversionRequest,
    CopyBackend, CopyTool, Outcome, PdfCleanup, ToolConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract text with Tika
  doctools text --tika-jar /opt/tika/tika-app.jar report.docx out/

  # 320x240 thumbnail of the first page
  doctools thumb --thumb 320x240 scan.tif out/

  # Convert to PDF, keep the output directory if nothing is produced
  doctools pdf --pdf-cleanup keep minutes.doc out/minutes

  # Record the copy command instead of running it
  doctools copy --log copies.log "Board Minutes.doc" archive/

  # Which family does a PRONOM identifier belong to?
  doctools classify fmt/412 x-fmt/111 fmt/999

  # Show the resolved tool commands
  doctools tools --json

EXIT STATUS:
  0  the destination was written, skipped (already present) or logged
  1  error (tool failed, timed out, could not start, I/O error)
  2  the tool ran but produced no output (text extraction, PDF conversion)

ENVIRONMENT VARIABLES:
  DOCTOOLS_JAVA             Java launcher for Tika (default: java)
  DOCTOOLS_TIKA_JAR         Tika app jar
  DOCTOOLS_IMAGEMAGICK      ImageMagick convert/magick executable
  DOCTOOLS_LIBREOFFICE      LibreOffice soffice executable
  DOCTOOLS_FFMPEG           FFmpeg executable (shown by `tools` only)
  DOCTOOLS_THUMB            Thumbnail bounding box, WxH
  DOCTOOLS_TIMEOUT          Per-tool timeout in seconds
  DOCTOOLS_COPY_BACKEND     cp, xcopy or robocopy
  DOCTOOLS_COPY_PROGRAM     Copier executable, if not on PATH
  DOCTOOLS_AUDIT_BACKEND    Copier whose command `copy --log` records
  DOCTOOLS_PDF_CLEANUP      remove-output-dir, remove-if-created or keep
  RUST_LOG                  Overrides -v / -q log filtering
"#;

/// Run document tools with timeouts, overwrite guards and uniform errors.
#[derive(Parser, Debug)]
#[command(
    name = "doctools",
    version,
    about = "Run document tools (Tika, ImageMagick, LibreOffice, copiers) with timeouts and overwrite guards",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    tools: ToolArgs,

    /// Print the outcome as JSON on stdout.
    #[arg(long, global = true, env = "DOCTOOLS_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, global = true, env = "DOCTOOLS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCTOOLS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOCTOOLS_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract plain text (soft failure: exit 2, no file).
    Text(TargetArgs),
    /// Render a PNG thumbnail of the first page/frame.
    Thumb(TargetArgs),
    /// Copy a file into a directory.
    Copy {
        input: PathBuf,
        out_dir: PathBuf,
        /// Replace an existing destination.
        #[arg(long)]
        overwrite: bool,
        /// Append the copy command to this file ("-" for stdout) instead of running it.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Convert a document to PDF with LibreOffice.
    Pdf {
        input: PathBuf,
        out_dir: PathBuf,
        /// Replace an existing destination.
        #[arg(long)]
        overwrite: bool,
    },
    /// Report which format families PRONOM identifiers belong to.
    Classify {
        #[arg(required = true)]
        puids: Vec<String>,
    },
    /// Print the resolved tool configuration.
    Tools,
}

#[derive(Args, Debug)]
struct TargetArgs {
    input: PathBuf,
    out_dir: PathBuf,
    /// Destination file name (default: input stem plus the format extension).
    #[arg(long)]
    name: Option<String>,
    /// Replace an existing destination.
    #[arg(long)]
    overwrite: bool,
}

#[derive(Args, Debug)]
struct ToolArgs {
    /// Java launcher used to run Tika.
    #[arg(long, global = true, env = "DOCTOOLS_JAVA")]
    java: Option<String>,

    /// Tika app jar.
    #[arg(long, global = true, env = "DOCTOOLS_TIKA_JAR")]
    tika_jar: Option<PathBuf>,

    /// ImageMagick executable.
    #[arg(long, global = true, env = "DOCTOOLS_IMAGEMAGICK")]
    imagemagick: Option<PathBuf>,

    /// LibreOffice executable.
    #[arg(long, global = true, env = "DOCTOOLS_LIBREOFFICE")]
    libreoffice: Option<PathBuf>,

    /// FFmpeg executable.
    #[arg(long, global = true, env = "DOCTOOLS_FFMPEG")]
    ffmpeg: Option<PathBuf>,

    /// Thumbnail bounding box, e.g. 1024x1024.
    #[arg(long, global = true, env = "DOCTOOLS_THUMB", value_parser = parse_geometry)]
    thumb: Option<(u32, u32)>,

    /// Per-tool timeout in seconds.
    #[arg(long, global = true, env = "DOCTOOLS_TIMEOUT",
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Copy backend.
    #[arg(long, global = true, env = "DOCTOOLS_COPY_BACKEND", value_enum)]
    copy_backend: Option<BackendArg>,

    /// Copier executable (default: the backend's name on PATH).
    #[arg(long, global = true, env = "DOCTOOLS_COPY_PROGRAM")]
    copy_program: Option<String>,

    /// Copy backend recorded by `copy --log`.
    #[arg(long, global = true, env = "DOCTOOLS_AUDIT_BACKEND", value_enum)]
    audit_backend: Option<BackendArg>,

    /// What to do with the output directory when no PDF is produced.
    #[arg(long, global = true, env = "DOCTOOLS_PDF_CLEANUP", value_enum)]
    pdf_cleanup: Option<CleanupArg>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    Cp,
    Xcopy,
    Robocopy,
}

impl From<BackendArg> for CopyBackend {
    fn from(v: BackendArg) -> Self {
        match v {
            BackendArg::Cp => CopyBackend::Cp,
            BackendArg::Xcopy => CopyBackend::Xcopy,
            BackendArg::Robocopy => CopyBackend::Robocopy,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CleanupArg {
    RemoveOutputDir,
    RemoveIfCreated,
    Keep,
}

impl From<CleanupArg> for PdfCleanup {
    fn from(v: CleanupArg) -> Self {
        match v {
            CleanupArg::RemoveOutputDir => PdfCleanup::RemoveOutputDir,
            CleanupArg::RemoveIfCreated => PdfCleanup::RemoveIfCreated,
            CleanupArg::Keep => PdfCleanup::Keep,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO lines would tear through the spinner, so they are only shown
    // when it is off.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if show_progress {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli.tools)?;

    match cli.command {
        Command::Classify { ref puids } => {
            classify(puids, cli.json)?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Tools => {
            print_tools(&config, cli.json)?;
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    // Ctrl-C kills the running tool instead of orphaning it.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let spinner = if show_progress {
        Some(spinner(&cli.command))
    } else {
        None
    };
    let start = Instant::now();

    let result = run(&cli.command, &config, cancel).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let outcome = result?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("Failed to serialise outcome")?
        );
    } else if !cli.quiet {
        let elapsed = dim(&format!("{:.1}s", start.elapsed().as_secs_f64()));
        match &outcome {
            Outcome::Written(p) => eprintln!("{} {}  {}", green("✔"), bold(&p.display().to_string()), elapsed),
            Outcome::Skipped(p) => eprintln!("{} {} already exists", dim("↷"), p.display()),
            Outcome::Logged(p) => eprintln!("{} copy to {} logged", dim("✎"), p.display()),
            Outcome::NoOutput => eprintln!("{} no output produced  {}", yellow("⚠"), elapsed),
        }
    }

    Ok(match outcome {
        Outcome::NoOutput => ExitCode::from(2),
        _ => ExitCode::SUCCESS,
    })
}

async fn run(command: &Command, config: &ToolConfig, cancel: CancellationToken) -> Result<Outcome> {
    let outcome = match command {
        Command::Text(t) => extract_text(config, &t.request(cancel))
            .await
            .context("Text extraction failed")?,
        Command::Thumb(t) => thumbnail(config, &t.request(cancel))
            .await
            .context("Thumbnail failed")?,
        Command::Copy {
            input,
            out_dir,
            overwrite,
            log,
        } => {
            let req = ConversionRequest::new(input, out_dir)
                .overwrite(*overwrite)
                .cancel_on(cancel);
            match log {
                Some(path) => {
                    let mut sink = open_log(path)?;
                    let outcome = copy_file_logged(config, &req, &mut *sink)
                        .await
                        .context("Audited copy failed")?;
                    sink.flush().context("Failed to flush copy log")?;
                    outcome
                }
                None => copy_file(config, &req).await.context("Copy failed")?,
            }
        }
        Command::Pdf {
            input,
            out_dir,
            overwrite,
        } => {
            let req = ConversionRequest::new(input, out_dir)
                .overwrite(*overwrite)
                .cancel_on(cancel);
            convert_to_pdf(config, &req)
                .await
                .context("PDF conversion failed")?
        }
        Command::Classify { .. } | Command::Tools => {
            anyhow::bail!("not a conversion command")
        }
    };
    Ok(outcome)
}

impl TargetArgs {
    fn request(&self, cancel: CancellationToken) -> ConversionRequest {
        let mut req = ConversionRequest::new(&self.input, &self.out_dir)
            .overwrite(self.overwrite)
            .cancel_on(cancel);
        if let Some(ref name) = self.name {
            req = req.out_name(name);
        }
        req
    }
}

/// Map CLI args to `ToolConfig`.
fn build_config(args: &ToolArgs) -> Result<ToolConfig> {
    let mut builder = ToolConfig::builder();

    if let Some(ref java) = args.java {
        builder = builder.java(java);
    }
    if let Some(ref jar) = args.tika_jar {
        builder = builder.tika_jar(jar);
    }
    if let Some(ref im) = args.imagemagick {
        builder = builder.imagemagick(im);
    }
    if let Some(ref lo) = args.libreoffice {
        builder = builder.libreoffice(lo);
    }
    if let Some(ref ff) = args.ffmpeg {
        builder = builder.ffmpeg(ff);
    }
    if let Some((w, h)) = args.thumb {
        builder = builder.thumb(w, h);
    }
    if let Some(secs) = args.timeout {
        builder = builder.timeout_secs(secs);
    }
    if args.copy_backend.is_some() || args.copy_program.is_some() {
        let backend = args
            .copy_backend
            .map(CopyBackend::from)
            .unwrap_or_else(CopyBackend::platform_default);
        let tool = match args.copy_program {
            Some(ref program) => CopyTool::new(backend, program),
            None => CopyTool::from(backend),
        };
        builder = builder.copy_tool(tool);
    }
    if let Some(backend) = args.audit_backend {
        builder = builder.audit_copy_tool(CopyTool::from(CopyBackend::from(backend)));
    }
    if let Some(policy) = args.pdf_cleanup {
        builder = builder.pdf_cleanup(policy.into());
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--thumb` of the form `WxH`.
fn parse_geometry(s: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{s}'"))?;
    let w: u32 = w.trim().parse().map_err(|_| format!("invalid width '{w}'"))?;
    let h: u32 = h.trim().parse().map_err(|_| format!("invalid height '{h}'"))?;
    if w == 0 || h == 0 {
        return Err(format!("dimensions must be positive, got '{s}'"));
    }
    Ok((w, h))
}

fn open_log(path: &Path) -> Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdout()));
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open copy log {:?}", path))?;
    Ok(Box::new(io::BufWriter::new(file)))
}

fn spinner(command: &Command) -> ProgressBar {
    let (prefix, input) = match command {
        Command::Text(t) => ("Extracting", t.input.as_path()),
        Command::Thumb(t) => ("Thumbnail", t.input.as_path()),
        Command::Copy { input, .. } => ("Copying", input.as_path()),
        Command::Pdf { input, .. } => ("Converting", input.as_path()),
        Command::Classify { .. } | Command::Tools => ("", Path::new("")),
    };
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix(prefix);
    bar.set_message(input.display().to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn classify(puids: &[String], json: bool) -> Result<()> {
    if json {
        let rows: Vec<_> = puids
            .iter()
            .map(|p| serde_json::json!({ "puid": p, "families": puid_formats::families(p) }))
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&rows).context("Failed to serialise classification")?
        );
        return Ok(());
    }
    for puid in puids {
        let families = puid_formats::families(puid);
        let label = if families.is_empty() {
            dim("unclassified")
        } else {
            families
                .iter()
                .map(Family::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!("{:<12} {}", puid, label);
    }
    Ok(())
}

fn print_tools(config: &ToolConfig, json: bool) -> Result<()> {
    let transcode = config.transcode_template().map(|t| t.to_string());
    if json {
        let value = serde_json::json!({
            "extract": config.extract_template().tokens(),
            "thumbnail": config.thumbnail_template().tokens(),
            "pdf": config.pdf_template().tokens(),
            "transcode": config.transcode_template().map(|t| t.tokens()),
            "thumb": config.thumb_geometry(),
            "timeout_secs": config.timeout().as_secs_f64(),
            "copy": config.copy_tool(),
            "audit_copy": config.audit_copy_tool(),
            "pdf_cleanup": config.pdf_cleanup(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&value).context("Failed to serialise configuration")?
        );
        return Ok(());
    }
    println!("Text extractor:     {}", config.extract_template());
    println!("Image converter:    {}", config.thumbnail_template());
    println!("Document converter: {}", config.pdf_template());
    println!(
        "Media transcoder:   {}",
        transcode.as_deref().unwrap_or("(not configured)")
    );
    println!("Thumbnail:          {}", config.thumb_geometry());
    println!("Timeout:            {:?}", config.timeout());
    println!(
        "Copier:             {} ({})",
        config.copy_tool().program,
        config.copy_tool().backend
    );
    println!(
        "Audit copier:       {} ({})",
        config.audit_copy_tool().program,
        config.audit_copy_tool().backend
    );
    println!("PDF cleanup:        {:?}", config.pdf_cleanup());
    Ok(())
}
