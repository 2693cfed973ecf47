//! Captured (piped) command execution.
//!
//! Two variants share the same spawn path: a synchronous form that waits for
//! the full output under a fixed time bound, and a streaming form that echoes
//! each line as it arrives while also accumulating it for the caller. The
//! streaming form carries no timeout of its own; cancellation is the caller's
//! concern.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::ExecError;

use super::ExecOutput;

/// Default bound for the synchronous variant.
pub const DEFAULT_CAPTURED_TIMEOUT: Duration = Duration::from_secs(30);

fn spawn_piped(shell: &str, command: &str) -> Result<tokio::process::Child, ExecError> {
    let mut cmd = Command::new(shell);
    // A dropped future must not leave the child running.
    cmd.kill_on_drop(true);
    cmd.arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd.spawn()
        .map_err(|e| ExecError::SpawnFailure(format!("{shell}: {e}")))
}

/// Spawn, wait up to `limit`, and return the full captured output.
///
/// On timeout the child is killed via `kill_on_drop` and the invocation
/// reports [`ExecError::Timeout`]. A non-zero exit status is not an error
/// here; the caller inspects `exit_code`.
pub async fn run_sync(shell: &str, command: &str, limit: Duration) -> Result<ExecOutput, ExecError> {
    let child = spawn_piped(shell, command)?;
    let collected = async {
        let output = child.wait_with_output().await?;
        Ok::<ExecOutput, ExecError>(ExecOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    };
    match timeout(limit, collected).await {
        Ok(out) => out,
        Err(_) => Err(ExecError::Timeout(limit)),
    }
}

/// Spawn with piped streams, echo each output line as it arrives, and return
/// the accumulated text once the child exits.
pub async fn run_streaming(shell: &str, command: &str) -> Result<ExecOutput, ExecError> {
    let mut child = spawn_piped(shell, command)?;

    let stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| ExecError::SpawnFailure("stdout pipe missing".into()))?;
    let stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| ExecError::SpawnFailure("stderr pipe missing".into()))?;

    // One task per stream so a chatty stderr never stalls stdout.
    let out_task = tokio::spawn(pump_lines(stdout_pipe, false));
    let err_task = tokio::spawn(pump_lines(stderr_pipe, true));

    let status = child.wait().await?;
    let stdout = join_pump(out_task).await?;
    let stderr = join_pump(err_task).await?;

    Ok(ExecOutput {
        exit_code: status.code().unwrap_or(-1),
        stdout,
        stderr,
    })
}

async fn join_pump(
    task: tokio::task::JoinHandle<Result<String, ExecError>>,
) -> Result<String, ExecError> {
    task.await
        .map_err(|e| ExecError::Io(std::io::Error::other(e)))?
}

/// Read a pipe line-by-line, echoing each line to the matching real stream
/// and accumulating the full text.
async fn pump_lines<R>(pipe: R, to_stderr: bool) -> Result<String, ExecError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut lines = BufReader::new(pipe).lines();
    let mut acc = String::new();
    while let Some(line) = lines.next_line().await? {
        if to_stderr {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
        acc.push_str(&line);
        acc.push('\n');
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sync_captures_stdout_and_stderr() {
        let out = run_sync("sh", "echo out; echo err >&2", DEFAULT_CAPTURED_TIMEOUT)
            .await
            .expect("command should run");
        assert_eq!(out.exit_code, 0);
        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.stderr, "err\n");
    }

    #[tokio::test]
    async fn sync_reports_nonzero_exit_in_output() {
        let out = run_sync("sh", "exit 3", DEFAULT_CAPTURED_TIMEOUT)
            .await
            .expect("command should run");
        assert_eq!(out.exit_code, 3);
    }

    #[tokio::test]
    async fn sync_times_out_instead_of_hanging() {
        let err = run_sync("sh", "sleep 5", Duration::from_millis(50))
            .await
            .expect_err("expected timeout");
        match err {
            ExecError::Timeout(limit) => assert_eq!(limit, Duration::from_millis(50)),
            other => panic!("expected Timeout, got: {other}"),
        }
    }

    #[tokio::test]
    async fn sync_spawn_failure_is_reported() {
        let err = run_sync(
            "/nonexistent/shell-binary",
            "echo hi",
            DEFAULT_CAPTURED_TIMEOUT,
        )
        .await
        .expect_err("expected spawn failure");
        assert!(
            matches!(err, ExecError::SpawnFailure(_)),
            "expected SpawnFailure, got: {err}"
        );
    }

    #[tokio::test]
    async fn streaming_accumulates_echoed_lines() {
        let out = run_streaming("sh", "echo hello")
            .await
            .expect("command should run");
        assert_eq!(out.exit_code, 0);
        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.stderr, "");
    }

    #[tokio::test]
    async fn streaming_preserves_line_order_per_stream() {
        let out = run_streaming("sh", "printf 'a\\nb\\nc\\n'")
            .await
            .expect("command should run");
        assert_eq!(out.stdout, "a\nb\nc\n");
    }

    #[tokio::test]
    async fn streaming_surfaces_exit_code() {
        let out = run_streaming("sh", "echo oops >&2; exit 7")
            .await
            .expect("command should run");
        assert_eq!(out.exit_code, 7);
        assert_eq!(out.stderr, "oops\n");
    }
}
