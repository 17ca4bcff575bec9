//! Integration tests for the doctools operations.
//!
//! Each test stands in for a real tool with a small `sh` script written into a
//! temporary directory, so the full path runs for real: spawn, deadline,
//! process-group kill and exit-code interpretation. Unix only.
//!
//! Run with:
//!   cargo test --test ops -- --nocapture

#![cfg(unix)]

use doctools::{
    convert_to_pdf, copy_file, copy_file_logged, extract_text, thumbnail, ConversionRequest,
    CopyBackend, CopyTool, DocToolsError, Outcome, PdfCleanup, ToolConfig, ToolKind,
};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Route library logs to the test harness; `RUST_LOG=doctools=debug` shows
/// every spawned command.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Write an executable `sh` script named `name` into `dir`.
fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

struct Fixture {
    root: TempDir,
}

impl Fixture {
    fn new() -> Self {
        init_tracing();
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    fn bin(&self) -> PathBuf {
        let dir = self.root.path().join("bin");
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn input(&self, name: &str) -> PathBuf {
        let dir = self.root.path().join("in");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, b"document body").unwrap();
        path
    }

    fn out(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }
}

// ── Extract Text ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_text_written_from_stdout() {
    let fx = Fixture::new();
    // java -jar <jar> -t <input>: the input is the fourth argument.
    let java = script(&fx.bin(), "java", r#"printf 'Extracted: %s\n' "$(basename "$4")""#);
    let config = ToolConfig::builder()
        .java(java.to_string_lossy())
        .tika_jar("/opt/tika app.jar")
        .build()
        .unwrap();
    let req = ConversionRequest::new(fx.input("Board Minutes.doc"), fx.out("text"));

    let outcome = extract_text(&config, &req).await.unwrap();

    let dest = fx.out("text").join("Board Minutes.txt");
    assert_eq!(outcome, Outcome::Written(dest.clone()));
    assert_eq!(
        std::fs::read_to_string(dest).unwrap(),
        "Extracted: Board Minutes.doc\n"
    );
}

#[tokio::test]
async fn test_text_failure_is_soft() {
    let fx = Fixture::new();
    let java = script(&fx.bin(), "java", "echo 'half a line'; echo 'tika blew up' >&2; exit 1");
    let config = ToolConfig::builder()
        .java(java.to_string_lossy())
        .build()
        .unwrap();
    let req = ConversionRequest::new(fx.input("a.doc"), fx.out("text"));

    assert_eq!(extract_text(&config, &req).await.unwrap(), Outcome::NoOutput);
    assert!(!fx.out("text").join("a.txt").exists());
}

#[tokio::test]
async fn test_text_timeout_is_soft() {
    let fx = Fixture::new();
    let java = script(&fx.bin(), "java", "sleep 30");
    let config = ToolConfig::builder()
        .java(java.to_string_lossy())
        .build()
        .unwrap();
    let req = ConversionRequest::new(fx.input("a.doc"), fx.out("text"))
        .timeout(Duration::from_millis(300));

    let start = Instant::now();
    assert_eq!(extract_text(&config, &req).await.unwrap(), Outcome::NoOutput);
    assert!(start.elapsed() < Duration::from_secs(10));
    assert!(!fx.out("text").join("a.txt").exists());
}

#[tokio::test]
async fn test_hostile_file_name_is_one_argument() {
    let fx = Fixture::new();
    let java = script(&fx.bin(), "java", r#"printf '%s|%s' "$#" "$(basename "$4")""#);
    let config = ToolConfig::builder()
        .java(java.to_string_lossy())
        .build()
        .unwrap();
    let name = "Minutes; echo pwned $(id) 'x'.doc";
    let req = ConversionRequest::new(fx.input(name), fx.out("text")).out_name("argv.txt");

    extract_text(&config, &req).await.unwrap();

    // java -jar <jar> -t <input>
    assert_eq!(
        std::fs::read_to_string(fx.out("text").join("argv.txt")).unwrap(),
        format!("4|{name}")
    );
}

// ── Generate Thumbnail ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_thumbnail_arguments() {
    let fx = Fixture::new();
    // Record every argument into the destination (the last argument).
    let convert = script(
        &fx.bin(),
        "convert",
        r#"for last; do :; done; printf '%s\n' "$@" > "$last""#,
    );
    let config = ToolConfig::builder()
        .imagemagick(&convert)
        .thumb(320, 240)
        .build()
        .unwrap();
    let input = fx.input("scan 01.tif");
    let req = ConversionRequest::new(&input, fx.out("thumbs"));

    let outcome = thumbnail(&config, &req).await.unwrap();

    let dest = fx.out("thumbs").join("scan 01.png");
    assert_eq!(outcome, Outcome::Written(dest.clone()));
    let args: Vec<String> = std::fs::read_to_string(&dest)
        .unwrap()
        .lines()
        .map(String::from)
        .collect();
    assert_eq!(
        args,
        vec![
            "-resize".to_string(),
            "320x240".to_string(),
            "-flatten".to_string(),
            "-quality".to_string(),
            "100".to_string(),
            format!("{}[0]", input.display()),
            dest.display().to_string(),
        ]
    );
}

#[tokio::test]
async fn test_thumbnail_missing_tool_is_error() {
    let fx = Fixture::new();
    let config = ToolConfig::builder()
        .imagemagick(fx.out("no-such-convert"))
        .build()
        .unwrap();
    let req = ConversionRequest::new(fx.input("a.tif"), fx.out("thumbs"));

    let err = thumbnail(&config, &req).await.unwrap_err();
    match err {
        DocToolsError::Exec { tool, ref command, .. } => {
            assert_eq!(tool, ToolKind::ImageConverter);
            assert!(command.contains("-resize 1024x1024"), "got: {command}");
        }
        other => panic!("expected Exec error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_thumbnail_cancelled() {
    let fx = Fixture::new();
    let convert = script(&fx.bin(), "convert", "sleep 30");
    let config = ToolConfig::builder().imagemagick(&convert).build().unwrap();
    let token = CancellationToken::new();
    let req = ConversionRequest::new(fx.input("a.tif"), fx.out("thumbs")).cancel_on(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        token.cancel();
    });
    let start = Instant::now();
    let err = thumbnail(&config, &req).await.unwrap_err();
    canceller.await.unwrap();

    assert!(err.is_cancelled(), "got: {err:?}");
    assert!(start.elapsed() < Duration::from_secs(10));
}

// ── Overwrite Guard ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_existing_destination_skips_tool() {
    let fx = Fixture::new();
    let ran = fx.out("ran");
    let convert = script(
        &fx.bin(),
        "convert",
        &format!("touch '{}'; exit 1", ran.display()),
    );
    let config = ToolConfig::builder().imagemagick(&convert).build().unwrap();
    let out = fx.out("thumbs");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("a.png"), b"old").unwrap();
    let req = ConversionRequest::new(fx.input("a.tif"), &out);

    assert_eq!(
        thumbnail(&config, &req).await.unwrap(),
        Outcome::Skipped(out.join("a.png"))
    );
    assert!(!ran.exists(), "tool must not run when skipping");

    // With overwrite the tool runs (and here fails).
    let err = thumbnail(&config, &req.clone().overwrite(true))
        .await
        .unwrap_err();
    assert!(matches!(err, DocToolsError::ToolFailed { .. }), "got: {err:?}");
    assert!(ran.exists());
}

// ── Copy File ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_copy_with_cp() {
    let fx = Fixture::new();
    let config = ToolConfig::builder()
        .copy_tool(CopyTool::from(CopyBackend::Cp))
        .build()
        .unwrap();
    let req = ConversionRequest::new(fx.input("My File.doc"), fx.out("copies"));

    let outcome = copy_file(&config, &req).await.unwrap();

    let dest = fx.out("copies").join("My File.doc");
    assert_eq!(outcome, Outcome::Written(dest.clone()));
    assert_eq!(std::fs::read(dest).unwrap(), b"document body");
}

#[tokio::test]
async fn test_copy_cp_failure() {
    let fx = Fixture::new();
    let config = ToolConfig::builder()
        .copy_tool(CopyTool::from(CopyBackend::Cp))
        .build()
        .unwrap();
    let req = ConversionRequest::new(fx.out("missing.doc"), fx.out("copies"));

    let err = copy_file(&config, &req).await.unwrap_err();
    assert!(matches!(err, DocToolsError::ToolFailed { .. }), "got: {err:?}");
}

fn robocopy(fx: &Fixture, exit: i32) -> ToolConfig {
    let program = script(
        &fx.bin(),
        &format!("robocopy{exit}"),
        &format!(r#"printf '%s\n' "$@" > "$2/args.txt"; exit {exit}"#),
    );
    ToolConfig::builder()
        .copy_tool(CopyTool::new(
            CopyBackend::Robocopy,
            program.to_string_lossy(),
        ))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_robocopy_one_means_copied() {
    let fx = Fixture::new();
    let input = fx.input("a.doc");
    let out = fx.out("copies");
    let req = ConversionRequest::new(&input, &out);

    let outcome = copy_file(&robocopy(&fx, 1), &req).await.unwrap();

    assert_eq!(outcome, Outcome::Written(out.join("a.doc")));
    let args = std::fs::read_to_string(out.join("args.txt")).unwrap();
    assert_eq!(
        args,
        format!(
            "{}\n{}\na.doc\n",
            input.parent().unwrap().display(),
            out.display()
        )
    );
}

#[tokio::test]
async fn test_robocopy_zero_means_nothing_copied() {
    let fx = Fixture::new();
    let req = ConversionRequest::new(fx.input("a.doc"), fx.out("copies"));

    let err = copy_file(&robocopy(&fx, 0), &req).await.unwrap_err();
    assert!(matches!(err, DocToolsError::NoFilesCopied { .. }), "got: {err:?}");
    assert!(err.to_string().contains("no files were copied"));
}

#[tokio::test]
async fn test_robocopy_eight_is_failure() {
    let fx = Fixture::new();
    let req = ConversionRequest::new(fx.input("a.doc"), fx.out("copies"));

    let err = copy_file(&robocopy(&fx, 8), &req).await.unwrap_err();
    match err {
        DocToolsError::ToolFailed { status, .. } => assert!(status.contains('8'), "got: {status}"),
        other => panic!("expected ToolFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_robocopy_timeout_is_exec_failure() {
    let fx = Fixture::new();
    let program = script(&fx.bin(), "robocopy", "sleep 30; exit 1");
    let config = ToolConfig::builder()
        .copy_tool(CopyTool::new(CopyBackend::Robocopy, program.to_string_lossy()))
        .timeout(Duration::from_millis(300))
        .build()
        .unwrap();
    let req = ConversionRequest::new(fx.input("a.doc"), fx.out("copies"));

    let start = Instant::now();
    let err = copy_file(&config, &req).await.unwrap_err();

    assert!(err.is_timeout(), "got: {err:?}");
    assert!(
        matches!(err, DocToolsError::Exec { tool: ToolKind::FileCopier, .. }),
        "got: {err:?}"
    );
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_copy_logged_executes_nothing() {
    let fx = Fixture::new();
    let config = ToolConfig::builder()
        .audit_copy_tool(CopyTool::from(CopyBackend::Xcopy))
        .build()
        .unwrap();
    let input = fx.input("Board Minutes.doc");
    let out = fx.out("copies");
    let req = ConversionRequest::new(&input, &out);

    let mut log = Vec::new();
    let outcome = copy_file_logged(&config, &req, &mut log).await.unwrap();

    assert_eq!(outcome, Outcome::Logged(out.join("Board Minutes.doc")));
    assert_eq!(
        String::from_utf8(log).unwrap(),
        format!("xcopy \"{}\" {}\n", input.display(), out.display())
    );
    assert!(!out.join("Board Minutes.doc").exists());
}

// ── Convert to PDF ───────────────────────────────────────────────────────────

/// soffice --headless --convert-to pdf:writer_pdf_Export --outdir <dir> <input>
fn soffice(fx: &Fixture, body: &str) -> PathBuf {
    script(
        &fx.bin(),
        "soffice",
        &format!(r#"outdir="$5"; input="$6"; name=$(basename "$input"); {body}"#),
    )
}

#[tokio::test]
async fn test_pdf_existence_beats_exit_code() {
    let fx = Fixture::new();
    let lo = soffice(&fx, r#"touch "$outdir/${name%.*}.pdf"; exit 81"#);
    let config = ToolConfig::builder().libreoffice(&lo).build().unwrap();
    let req = ConversionRequest::new(fx.input("Minutes.DOCX"), fx.out("pdf"));

    let outcome = convert_to_pdf(&config, &req).await.unwrap();
    assert_eq!(outcome, Outcome::Written(fx.out("pdf").join("Minutes.pdf")));
}

#[tokio::test]
async fn test_pdf_missing_output_removes_dir() {
    let fx = Fixture::new();
    let lo = soffice(&fx, r#"touch "$outdir/lock"; exit 0"#);
    let config = ToolConfig::builder().libreoffice(&lo).build().unwrap();
    let out = fx.out("pdf");
    let req = ConversionRequest::new(fx.input("a.doc"), &out);

    assert_eq!(convert_to_pdf(&config, &req).await.unwrap(), Outcome::NoOutput);
    assert!(!out.exists(), "output directory should be removed");
}

#[tokio::test]
async fn test_pdf_missing_output_keep_policy() {
    let fx = Fixture::new();
    let lo = soffice(&fx, "exit 0");
    let config = ToolConfig::builder()
        .libreoffice(&lo)
        .pdf_cleanup(PdfCleanup::Keep)
        .build()
        .unwrap();
    let out = fx.out("pdf");
    let req = ConversionRequest::new(fx.input("a.doc"), &out);

    assert_eq!(convert_to_pdf(&config, &req).await.unwrap(), Outcome::NoOutput);
    assert!(out.is_dir());
}

#[tokio::test]
async fn test_pdf_remove_if_created_spares_shared_dir() {
    let fx = Fixture::new();
    let lo = soffice(&fx, "exit 0");
    let config = ToolConfig::builder()
        .libreoffice(&lo)
        .pdf_cleanup(PdfCleanup::RemoveIfCreated)
        .build()
        .unwrap();
    let out = fx.out("shared");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("keep.txt"), b"x").unwrap();
    let req = ConversionRequest::new(fx.input("a.doc"), &out);

    assert_eq!(convert_to_pdf(&config, &req).await.unwrap(), Outcome::NoOutput);
    assert!(out.join("keep.txt").exists());
}

#[tokio::test]
async fn test_pdf_timeout_is_error_and_cleans_up() {
    let fx = Fixture::new();
    let lo = soffice(&fx, "sleep 30");
    let config = ToolConfig::builder()
        .libreoffice(&lo)
        .timeout(Duration::from_millis(300))
        .build()
        .unwrap();
    let out = fx.out("pdf");
    let req = ConversionRequest::new(fx.input("a.doc"), &out);

    let start = Instant::now();
    let err = convert_to_pdf(&config, &req).await.unwrap_err();
    assert!(err.is_timeout(), "got: {err:?}");
    assert!(start.elapsed() < Duration::from_secs(10));
    assert!(!out.exists());
}

#[tokio::test]
async fn test_pdf_kills_forked_helpers() {
    let fx = Fixture::new();
    let survivor = fx.out("survivor");
    // The helper would create the marker if it outlived the kill.
    let lo = soffice(
        &fx,
        &format!("(sleep 1; touch '{}') & wait", survivor.display()),
    );
    let config = ToolConfig::builder()
        .libreoffice(&lo)
        .timeout(Duration::from_millis(200))
        .pdf_cleanup(PdfCleanup::Keep)
        .build()
        .unwrap();
    let req = ConversionRequest::new(fx.input("a.doc"), fx.out("pdf"));

    let err = convert_to_pdf(&config, &req).await.unwrap_err();
    assert!(err.is_timeout(), "got: {err:?}");
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!survivor.exists(), "forked helper survived the group kill");
}

#[tokio::test]
async fn test_pdf_non_utf8_name_is_found() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fx = Fixture::new();
    let lo = soffice(&fx, r#"touch "$outdir/${name%.*}.pdf""#);
    let config = ToolConfig::builder().libreoffice(&lo).build().unwrap();
    let input = fx.input("placeholder").with_file_name(OsStr::from_bytes(b"caf\xe9.doc"));
    std::fs::write(&input, b"document body").unwrap();
    let out = fx.out("pdf");
    let req = ConversionRequest::new(&input, &out);

    let outcome = convert_to_pdf(&config, &req).await.unwrap();

    let dest = out.join(OsStr::from_bytes(b"caf\xe9.pdf"));
    assert_eq!(outcome, Outcome::Written(dest.clone()));
    assert!(dest.is_file(), "the converted PDF must survive");
}

#[tokio::test]
async fn test_pdf_helper_holding_pipes_does_not_hide_result() {
    let fx = Fixture::new();
    // Converter finishes, but a forked helper keeps stderr open.
    let lo = soffice(&fx, r#"touch "$outdir/${name%.*}.pdf"; sleep 30 & exit 0"#);
    let config = ToolConfig::builder()
        .libreoffice(&lo)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let out = fx.out("pdf");
    let req = ConversionRequest::new(fx.input("a.doc"), &out);

    let start = Instant::now();
    let outcome = convert_to_pdf(&config, &req).await.unwrap();

    assert_eq!(outcome, Outcome::Written(out.join("a.pdf")));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_pdf_cleanup_failure_is_reported() {
    // SAFETY: geteuid has no preconditions.
    if unsafe { libc::geteuid() } == 0 {
        println!("SKIP: directory permissions do not bind root");
        return;
    }
    let fx = Fixture::new();
    let lo = soffice(&fx, "exit 0");
    let config = ToolConfig::builder().libreoffice(&lo).build().unwrap();
    let parent = fx.out("locked");
    let out = parent.join("pdf");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("other.txt"), b"x").unwrap();
    std::fs::set_permissions(&parent, std::fs::Permissions::from_mode(0o555)).unwrap();
    let req = ConversionRequest::new(fx.input("a.doc"), &out);

    let result = convert_to_pdf(&config, &req).await;
    std::fs::set_permissions(&parent, std::fs::Permissions::from_mode(0o755)).unwrap();

    let err = result.unwrap_err();
    let msg = err.to_string();
    match err {
        DocToolsError::CleanupFailed {
            output,
            dir,
            missing,
            source,
        } => {
            assert_eq!(output, out.join("a.pdf"));
            assert_eq!(dir, out);
            assert_eq!(missing.kind(), std::io::ErrorKind::NotFound);
            assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            assert!(msg.contains(&missing.to_string()), "got: {msg}");
            assert!(msg.contains(&source.to_string()), "got: {msg}");
        }
        other => panic!("expected CleanupFailed, got {other:?}"),
    }
    assert!(out.is_dir());
}
