//! Run an external program and capture its output and exit status.
//!
//! Standard output and error are redirected into anonymous temp files rather
//! than pipes. The supervising thread can then poll for exit (when a timeout
//! is set) without the child ever blocking on a full pipe, and a killed child
//! that leaves grandchildren behind cannot hold the capture open.
//!
//! On unix the child leads its own process group, and a timeout kills the
//! whole group so nothing it spawned outlives the cell.

use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Interval between exit checks while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Everything observed about one finished (or killed) program run.
#[derive(Debug)]
pub struct ProgramOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit status; `None` only if the child could not be reaped after a kill.
    pub status: Option<ExitStatus>,
    pub timed_out: bool,
    pub elapsed: Duration,
}

impl ProgramOutput {
    /// Exited on its own with status 0.
    #[must_use]
    pub fn success(&self) -> bool {
        !self.timed_out && self.status.is_some_and(|s| s.success())
    }

    /// Numeric exit code, if the process exited normally.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        self.status.and_then(|s| s.code())
    }
}

/// Spawn `program` with `args` and extra environment, stdin closed.
///
/// With `timeout == None` the wait is unbounded. With a timeout the child is
/// killed once it expires and `timed_out` is set on the result.
///
/// # Errors
///
/// Returns an error if the program cannot be spawned or its output cannot be
/// captured.
pub fn run_program<I, S, E, K, V>(
    program: &Path,
    args: I,
    envs: E,
    timeout: Option<Duration>,
) -> io::Result<ProgramOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut stdout_file = tempfile::tempfile()?;
    let mut stderr_file = tempfile::tempfile()?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .envs(envs)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_file.try_clone()?))
        .stderr(Stdio::from(stderr_file.try_clone()?));
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let start = Instant::now();
    let mut child = cmd.spawn()?;
    // The parent's copies of the capture handles live in `cmd`.
    drop(cmd);
    debug!(program = %program.display(), pid = child.id(), "Spawned");

    let (status, timed_out) = match timeout {
        None => (Some(child.wait()?), false),
        Some(limit) => wait_with_deadline(&mut child, limit)?,
    };
    let elapsed = start.elapsed();

    Ok(ProgramOutput {
        stdout: read_capture(&mut stdout_file)?,
        stderr: read_capture(&mut stderr_file)?,
        status,
        timed_out,
        elapsed,
    })
}

fn wait_with_deadline(
    child: &mut Child,
    limit: Duration,
) -> io::Result<(Option<ExitStatus>, bool)> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((Some(status), false));
        }
        if Instant::now() >= deadline {
            break;
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    warn!(
        pid = child.id(),
        limit_ms = limit.as_millis(),
        "Timeout expired, killing process group"
    );
    kill_tree(child);
    let status = child.wait().ok();
    Ok((status, true))
}

#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(pgid) = i32::try_from(child.id()) else {
        kill_child(child);
        return;
    };
    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(err) => {
            warn!(pgid, error = %err, "Failed to kill process group");
            kill_child(child);
        }
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    kill_child(child);
}

fn kill_child(child: &mut Child) {
    if let Err(err) = child.kill() {
        // InvalidInput: it exited between the last poll and the kill.
        if err.kind() != io::ErrorKind::InvalidInput {
            warn!(error = %err, "Failed to kill child");
        }
    }
}

fn read_capture(file: &mut File) -> io::Result<String> {
    file.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
