//! Bounded execution: run an [`Invocation`] with a deadline.
//!
//! The child is spawned, then its completion is raced against a deadline
//! timer (and an optional cancellation token) in one `tokio::select!`.
//! Whichever branch wins, the losing futures are dropped before this function
//! returns, so the timer can never fire after a normal exit.
//!
//! ## Termination
//!
//! On Unix the child leads its own process group. LibreOffice and Java both
//! fork helpers, and killing only the leader would leave those running with
//! our pipes open. On overrun the whole group gets `SIGKILL`, then the leader
//! is killed and reaped. Signalling a group or process that has already gone
//! (`ESRCH`, or `InvalidInput` from tokio) is expected and not an error.
//!
//! Exit is judged by the leader alone. Its pipes are drained by separate
//! tasks; if a helper it forked still holds them open shortly after the
//! leader exits, that helper's group is killed and the leader's real status
//! is still returned. Stderr is read through a fixed-size ring, so a chatty
//! tool cannot grow memory.
//!
//! `kill_on_drop(true)` covers the remaining exit path: the caller dropping
//! the future mid-run.

use crate::error::ExecError;
use crate::pipeline::command::Invocation;
use std::collections::VecDeque;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How much trailing stderr to keep for diagnostics.
pub const STDERR_TAIL_BYTES: usize = 4096;

/// Upper bound on reaping a killed leader.
const REAP_GRACE: Duration = Duration::from_secs(5);

/// How long pipes may stay open after the leader exits before the rest of
/// its process group is killed.
const PIPE_DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Per-call execution options.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Wall-clock limit from spawn to exit.
    pub timeout: Duration,
    /// Optional external cancellation, raced alongside the deadline.
    pub cancel: Option<CancellationToken>,
    /// Keep the child's stdout. When false stdout goes to the null device.
    pub capture_stdout: bool,
}

impl ExecOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            cancel: None,
            capture_stdout: false,
        }
    }

    pub fn with_cancel(mut self, token: Option<CancellationToken>) -> Self {
        self.cancel = token;
        self
    }

    pub fn capture_stdout(mut self, v: bool) -> Self {
        self.capture_stdout = v;
        self
    }
}

/// A process that ran to completion before the deadline.
#[derive(Debug)]
pub struct Completion {
    pub status: ExitStatus,
    /// Captured stdout; empty unless [`ExecOptions::capture_stdout`] was set.
    pub stdout: Vec<u8>,
    /// Last [`STDERR_TAIL_BYTES`] of stderr, lossily decoded.
    pub stderr_tail: String,
    pub elapsed: Duration,
}

impl Completion {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, or `None` when the process died from a signal.
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}

enum Interrupt {
    Deadline,
    Cancelled,
}

/// Run `invocation` to completion or until the deadline / cancellation.
///
/// # Errors
/// - [`ExecError::Start`] — spawn failed; returned before any timer is armed
/// - [`ExecError::TimedOut`] — deadline hit, process group killed
/// - [`ExecError::Cancelled`] — token fired, process group killed
/// - [`ExecError::Wait`] — waiting or pipe I/O failed
///
/// A non-zero exit is **not** an error here; callers interpret the status.
pub async fn run_bounded(
    invocation: &Invocation,
    opts: &ExecOptions,
) -> Result<Completion, ExecError> {
    let mut cmd = invocation.to_command();
    cmd.stdin(Stdio::null())
        .stdout(if opts.capture_stdout {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    debug!("Spawning: {}", invocation);
    let start = Instant::now();
    let mut child = cmd.spawn().map_err(ExecError::Start)?;
    let pid = child.id();
    let out_task = tokio::spawn(read_all(child.stdout.take()));
    let err_task = tokio::spawn(read_tail(child.stderr.take(), STDERR_TAIL_BYTES));

    let interrupt = tokio::select! {
        res = child.wait() => {
            let status = res.map_err(ExecError::Wait)?;
            let elapsed = start.elapsed();
            debug!("Exited with {} after {:?}", status, elapsed);
            let (stdout, stderr) = drain(pid, out_task, err_task).await?;
            return Ok(Completion {
                status,
                stdout,
                stderr_tail: String::from_utf8_lossy(&stderr).into_owned(),
                elapsed,
            });
        }
        _ = tokio::time::sleep(opts.timeout) => Interrupt::Deadline,
        _ = cancelled(opts.cancel.as_ref()) => Interrupt::Cancelled,
    };

    match interrupt {
        Interrupt::Deadline => warn!(
            "Killing {} after {:?} timeout",
            invocation.program().to_string_lossy(),
            opts.timeout
        ),
        Interrupt::Cancelled => warn!(
            "Killing {}: cancelled",
            invocation.program().to_string_lossy()
        ),
    }
    terminate(&mut child, pid).await;
    out_task.abort();
    err_task.abort();

    Err(match interrupt {
        Interrupt::Deadline => ExecError::TimedOut {
            after: opts.timeout,
        },
        Interrupt::Cancelled => ExecError::Cancelled,
    })
}

/// Resolve when `token` is cancelled; never resolve without one.
async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(t) => t.cancelled().await,
        None => std::future::pending().await,
    }
}

type PipeTask = JoinHandle<std::io::Result<Vec<u8>>>;

/// Collect both pipes after the leader has exited.
///
/// A forked helper that outlives the leader keeps the pipes open. After
/// [`PIPE_DRAIN_GRACE`] the rest of the group is killed so the readers see
/// EOF; the leader's status has already been taken by then.
async fn drain(
    pid: Option<u32>,
    out_task: PipeTask,
    err_task: PipeTask,
) -> Result<(Vec<u8>, Vec<u8>), ExecError> {
    let joined = async {
        let (out, err) = tokio::join!(out_task, err_task);
        Ok::<_, ExecError>((pipe_output(out)?, pipe_output(err)?))
    };
    tokio::pin!(joined);

    if let Ok(res) = tokio::time::timeout(PIPE_DRAIN_GRACE, &mut joined).await {
        return res;
    }
    debug!("Pipes still open {:?} after exit; killing leftover helpers", PIPE_DRAIN_GRACE);
    #[cfg(unix)]
    if let Some(pid) = pid {
        kill_group(pid);
    }
    #[cfg(not(unix))]
    let _ = pid;

    match tokio::time::timeout(REAP_GRACE, &mut joined).await {
        Ok(res) => res,
        Err(_) => Err(ExecError::Wait(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "output pipes held open after the process exited",
        ))),
    }
}

fn pipe_output(
    joined: Result<std::io::Result<Vec<u8>>, tokio::task::JoinError>,
) -> Result<Vec<u8>, ExecError> {
    joined
        .map_err(|e| ExecError::Wait(std::io::Error::other(e)))?
        .map_err(ExecError::Wait)
}

async fn read_all<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut p) = pipe {
        p.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Read `pipe` to EOF keeping only the last `max` bytes.
async fn read_tail<R: AsyncRead + Unpin>(pipe: Option<R>, max: usize) -> std::io::Result<Vec<u8>> {
    let mut ring = VecDeque::with_capacity(max);
    let Some(mut p) = pipe else {
        return Ok(Vec::new());
    };
    let mut chunk = vec![0u8; 8192];
    loop {
        let n = p.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let data = &chunk[n.saturating_sub(max)..n];
        let overflow = (ring.len() + data.len()).saturating_sub(max);
        ring.drain(..overflow);
        ring.extend(data);
    }
    Ok(ring.into())
}

/// Kill the child's process group and the child, then reap it.
async fn terminate(child: &mut tokio::process::Child, pid: Option<u32>) {
    #[cfg(unix)]
    if let Some(pid) = pid {
        kill_group(pid);
    }
    #[cfg(not(unix))]
    let _ = pid;

    if let Err(e) = child.start_kill() {
        debug!("Leader already gone: {}", e);
    }
    match tokio::time::timeout(REAP_GRACE, child.wait()).await {
        Ok(Ok(status)) => debug!("Reaped killed process: {}", status),
        Ok(Err(e)) => debug!("Reaping killed process failed: {}", e),
        Err(_) => warn!("Killed process not reaped after {:?}", REAP_GRACE),
    }
}

#[cfg(unix)]
fn kill_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // SAFETY: killpg only sends a signal; it touches no memory of ours.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            debug!("Process group {} already gone", pgid);
        } else {
            warn!("killpg({}) failed: {}", pgid, err);
        }
    }
}
