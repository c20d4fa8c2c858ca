use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Runs external programs on behalf of the core.
///
/// Implementations never fail: a missing program, a nonzero exit or a timeout
/// all come back as whatever stdout was captured, possibly nothing.
pub trait CommandShell: Send + Sync {
    fn run(&self, program: &str, args: &[&str], timeout: Duration) -> String;
}

/// Spawns real processes.
pub struct SystemShell;

const WAIT_STEP: Duration = Duration::from_millis(20);
/// How long output may keep arriving after the process has exited.
const DRAIN_GRACE: Duration = Duration::from_millis(100);

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

impl CommandShell for SystemShell {
    fn run(&self, program: &str, args: &[&str], timeout: Duration) -> String {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(program, error = %e, "failed to spawn command");
                return String::new();
            }
        };

        let Some(mut stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return String::new();
        };
        // The reader forwards chunks as they arrive. A grandchild that
        // inherited the pipe can hold it open past the deadline, so the
        // reader is never joined.
        let (tx, rx) = mpsc::channel::<Vec<u8>>();
        thread::spawn(move || {
            let mut chunk = [0u8; 4096];
            loop {
                match stdout.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.send(chunk[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    if !status.success() {
                        debug!(program, %status, "command exited unsuccessfully");
                    }
                    break;
                }
                Ok(None) if Instant::now() >= deadline => {
                    warn!(program, timeout_ms = timeout.as_millis() as u64, "command timed out");
                    kill_tree(&mut child);
                    break;
                }
                Ok(None) => thread::sleep(WAIT_STEP),
                Err(e) => {
                    warn!(program, error = %e, "failed to wait for command");
                    kill_tree(&mut child);
                    break;
                }
            }
        }

        let drain_until = deadline.max(Instant::now() + DRAIN_GRACE);
        let mut bytes = Vec::new();
        loop {
            let left = drain_until.saturating_duration_since(Instant::now());
            match rx.recv_timeout(left) {
                Ok(chunk) => bytes.extend_from_slice(&chunk),
                Err(RecvTimeoutError::Timeout) => {
                    debug!(program, "output pipe still open, returning partial output");
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Kill `child` and everything it started.
fn kill_tree(child: &mut Child) {
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        let pid = child.id().to_string();
        let _ = Command::new("taskkill")
            .args(["/T", "/F", "/PID", &pid])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .creation_flags(CREATE_NO_WINDOW)
            .status();
    }
    let _ = child.kill();
    let _ = child.wait();
}
