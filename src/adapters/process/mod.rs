//! Shared child-process runner for the extractor and transcoder adapters
//!
//! Output of the child is forwarded line by line to the log while the
//! process runs, so neither pipe can fill up and stall it. The child is
//! spawned with `kill_on_drop`: dropping the returned future (for example
//! when a job deadline fires) terminates the process. On unix the child also
//! leads its own process group, and the whole group is killed on drop so
//! helpers it started (yt-dlp runs ffmpeg to merge streams) go with it.

use std::ffi::OsStr;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

use crate::domain::errors::DomainError;
use crate::ports::ProcessReport;

/// Spawn `program` with `args`, forward its output to the log and wait for exit
pub async fn run_streaming<I, S>(
    tool: &'static str,
    program: &OsStr,
    args: I,
) -> Result<ProcessReport, DomainError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command
        .spawn()
        .map_err(|e| {
            DomainError::ProcessFailed(format!(
                "Failed to start {} ({}): {}",
                tool,
                program.to_string_lossy(),
                e
            ))
        })?;

    #[cfg(unix)]
    let mut group = GroupGuard::new(tool, child.id());

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (status, _, _) = tokio::join!(
        child.wait(),
        forward_lines(tool, "stdout", stdout),
        forward_lines(tool, "stderr", stderr),
    );

    #[cfg(unix)]
    group.disarm();

    let status = status
        .map_err(|e| DomainError::ProcessFailed(format!("Failed to wait for {}: {}", tool, e)))?;

    debug!(tool, code = ?status.code(), "process exited");

    Ok(ProcessReport {
        success: status.success(),
        exit_code: status.code(),
    })
}

/// Kills the child's process group when dropped before the child was waited on
#[cfg(unix)]
struct GroupGuard {
    tool: &'static str,
    pgid: Option<Pid>,
}

#[cfg(unix)]
impl GroupGuard {
    fn new(tool: &'static str, pid: Option<u32>) -> Self {
        Self {
            tool,
            pgid: pid.and_then(|pid| i32::try_from(pid).ok()).map(Pid::from_raw),
        }
    }

    fn disarm(&mut self) {
        self.pgid = None;
    }
}

#[cfg(unix)]
impl Drop for GroupGuard {
    fn drop(&mut self) {
        let Some(pgid) = self.pgid.take() else {
            return;
        };
        match signal::killpg(pgid, Signal::SIGKILL) {
            Ok(()) => debug!(tool = self.tool, pgid = pgid.as_raw(), "killed process group"),
            Err(Errno::ESRCH) => {}
            Err(e) => warn!(tool = self.tool, pgid = pgid.as_raw(), error = %e, "failed to kill process group"),
        }
    }
}

/// Forward each line of `reader` to the log until EOF
async fn forward_lines<R>(tool: &'static str, stream: &'static str, reader: Option<R>)
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return;
    };

    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                // Tools print progress with bare carriage returns
                let line = String::from_utf8_lossy(&buf);
                for part in line.split('\r') {
                    let part = part.trim_end();
                    if !part.is_empty() {
                        debug!(tool, stream, "{}", part);
                    }
                }
            }
            Err(e) => {
                warn!(tool, stream, error = %e, "stopped reading process output");
                break;
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reports_success() {
        let report = run_streaming("sh", OsStr::new("sh"), ["-c", "echo hello; echo oops >&2"])
            .await
            .unwrap();
        assert!(report.success);
        assert_eq!(report.exit_code, Some(0));
    }

    #[tokio::test]
    async fn test_reports_exit_code() {
        let report = run_streaming("sh", OsStr::new("sh"), ["-c", "exit 3"])
            .await
            .unwrap();
        assert!(!report.success);
        assert_eq!(report.exit_code, Some(3));
    }

    #[tokio::test]
    async fn test_large_output_does_not_block() {
        let report = run_streaming(
            "sh",
            OsStr::new("sh"),
            ["-c", "i=0; while [ $i -lt 20000 ]; do echo line $i >&2; i=$((i+1)); done"],
        )
        .await
        .unwrap();
        assert!(report.success);
    }

    #[tokio::test]
    async fn test_dropped_run_kills_background_helpers() {
        let dir = tempfile::TempDir::new().unwrap();
        let late_file = dir.path().join("late.mp4");
        let script = format!("(sleep 0.6; echo late > '{}') & sleep 5", late_file.display());

        let run = run_streaming("sh", OsStr::new("sh"), ["-c", script.as_str()]);
        let result = tokio::time::timeout(std::time::Duration::from_millis(300), run).await;
        assert!(result.is_err());

        tokio::time::sleep(std::time::Duration::from_millis(900)).await;
        assert!(!late_file.exists());
    }

    #[tokio::test]
    async fn test_missing_binary_is_process_error() {
        let result = run_streaming(
            "missing",
            OsStr::new("/nonexistent/clipcut-test-binary"),
            Vec::<String>::new(),
        )
        .await;
        assert!(matches!(result, Err(DomainError::ProcessFailed(_))));
    }
}
