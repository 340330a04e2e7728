//! Subprocess plumbing: PATH lookup and run-with-timeout.

use crate::SplaceError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Bytes of stderr kept for error messages
pub const STDERR_TAIL_BYTES: usize = 1000;

#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn stderr_tail(&self) -> String {
        tail(&self.stderr, STDERR_TAIL_BYTES)
    }
}

/// Last `limit` bytes of `bytes` as lossy UTF-8, trimmed
pub fn tail(bytes: &[u8], limit: usize) -> String {
    let start = bytes.len().saturating_sub(limit);
    String::from_utf8_lossy(&bytes[start..]).trim().to_string()
}

fn is_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(path) {
            Ok(metadata) => metadata.permissions().mode() & 0o111 != 0,
            Err(_) => false,
        }
    }

    #[cfg(not(unix))]
    {
        true
    }
}

/// Resolve a binary name against `PATH`. Names containing a path separator
/// are checked as given.
pub fn find_executable<S: AsRef<OsStr>>(binary: S) -> Option<PathBuf> {
    let binary = Path::new(binary.as_ref());
    if binary.components().count() > 1 {
        return is_executable(binary).then(|| binary.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(binary))
        .find(|candidate| is_executable(candidate))
}

fn collect<R>(reader: Option<R>) -> JoinHandle<std::io::Result<Vec<u8>>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut reader) = reader {
            reader.read_to_end(&mut buf).await?;
        }
        Ok(buf)
    })
}

async fn join_output(handle: JoinHandle<std::io::Result<Vec<u8>>>) -> Result<Vec<u8>, SplaceError> {
    handle
        .await
        .map_err(|e| SplaceError::Other(format!("output reader failed: {}", e)))?
        .map_err(SplaceError::from)
}

#[cfg(unix)]
fn kill_process_group(child: &Child, tool: &str) {
    let Some(pid) = child.id() else {
        return;
    };
    // The child leads its own group, so -pid addresses all of it
    let rc = unsafe { libc::kill(-(pid as libc::pid_t), libc::SIGKILL) };
    if rc != 0 {
        debug!(
            "Failed to signal process group of {}: {}",
            tool,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child, _tool: &str) {}

/// Run `command` to completion, capturing stdout and stderr.
///
/// With a timeout, a process still running when it expires is killed along
/// with its process group and reaped before `SplaceError::Timeout` is
/// returned. A binary that cannot be started is a `Precondition` error.
/// Exit status is not checked here.
pub async fn run_command(
    tool: &str,
    mut command: Command,
    timeout: Option<Duration>,
) -> Result<ProcessOutput, SplaceError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    // Own process group, so a timeout also reaches workers a wrapper script started
    #[cfg(unix)]
    command.process_group(0);

    debug!("Running {:?}", command.as_std());
    let mut child = command.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            SplaceError::Precondition(format!("{} could not be started: {}", tool, e))
        }
        _ => SplaceError::Io(e),
    })?;

    let stdout = collect(child.stdout.take());
    let stderr = collect(child.stderr.take());

    let status = match timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                kill_process_group(&child, tool);
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed-out {}: {}", tool, e);
                }
                stdout.abort();
                stderr.abort();
                return Err(SplaceError::Timeout {
                    tool: tool.to_string(),
                    seconds: limit.as_secs(),
                });
            }
        },
        None => child.wait().await?,
    };

    Ok(ProcessOutput {
        status,
        stdout: join_output(stdout).await?,
        stderr: join_output(stderr).await?,
    })
}

/// Like [`run_command`], but a non-zero exit is a `ToolFailed` error carrying
/// the stderr tail.
pub async fn run_checked(
    tool: &str,
    command: Command,
    timeout: Option<Duration>,
) -> Result<ProcessOutput, SplaceError> {
    let output = run_command(tool, command, timeout).await?;
    if !output.status.success() {
        return Err(SplaceError::ToolFailed {
            tool: tool.to_string(),
            message: format!("{} ({})", output.status, output.stderr_tail()),
        });
    }
    Ok(output)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn test_tail() {
        assert_eq!(tail(b"abcdef", 3), "def");
        assert_eq!(tail(b"  ab \n", 100), "ab");
    }

    #[test]
    fn test_find_executable() {
        assert!(find_executable("sh").is_some());
        assert!(find_executable("definitely-not-a-real-binary-xyz").is_none());
        assert!(find_executable("/definitely/not/here").is_none());
    }

    #[tokio::test]
    async fn test_captures_output() {
        let out = run_checked("sh", sh("echo hello; echo oops >&2"), None)
            .await
            .unwrap();
        assert_eq!(out.stdout, b"hello\n");
        assert_eq!(out.stderr_tail(), "oops");
    }

    #[tokio::test]
    async fn test_non_zero_exit() {
        let err = run_checked("sh", sh("echo broken >&2; exit 3"), None)
            .await
            .unwrap_err();
        match err {
            SplaceError::ToolFailed { tool, message } => {
                assert_eq!(tool, "sh");
                assert!(message.contains("broken"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_precondition() {
        let cmd = Command::new("definitely-not-a-real-binary-xyz");
        let err = run_command("ghost", cmd, None).await.unwrap_err();
        assert!(matches!(err, SplaceError::Precondition(_)));
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let started = Instant::now();
        let mut cmd = Command::new("sleep");
        cmd.arg("30");
        let err = run_command("sleep", cmd, Some(Duration::from_secs(1)))
            .await
            .unwrap_err();

        assert!(matches!(err, SplaceError::Timeout { seconds: 1, .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(target_os = "linux")]
    fn is_running(pid: &str) -> bool {
        std::fs::read_to_string(format!("/proc/{}/stat", pid))
            .ok()
            .and_then(|stat| {
                let (_, rest) = stat.rsplit_once(')')?;
                rest.trim_start().chars().next()
            })
            .is_some_and(|state| state != 'Z' && state != 'X')
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timeout_kills_background_workers() {
        let dir = tempfile::TempDir::new().unwrap();
        let pid_file = dir.path().join("worker.pid");
        let script = format!("sleep 30 &\necho $! > '{}'\nwait", pid_file.display());

        let err = run_command("wrapper", sh(&script), Some(Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, SplaceError::Timeout { .. }));

        let pid = std::fs::read_to_string(&pid_file).unwrap().trim().to_string();
        let mut running = true;
        for _ in 0..50 {
            running = is_running(&pid);
            if !running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(!running, "worker {} outlived the timeout", pid);
    }
}
