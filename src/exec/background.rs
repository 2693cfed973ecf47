//! Fire-and-forget command launch.

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::ExecError;

use super::ExecOutput;

/// Launch `command` detached, with all three standard streams discarded.
///
/// Returns immediately with an acknowledgement; the child is never waited on
/// and its lifetime is unmanaged. A spawn failure is the only reportable
/// error.
pub fn launch(shell: &str, command: &str) -> Result<ExecOutput, ExecError> {
    let mut cmd = Command::new(shell);
    // No kill_on_drop: the child must outlive the handle.
    cmd.arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let child = cmd
        .spawn()
        .map_err(|e| ExecError::SpawnFailure(format!("{shell}: {e}")))?;
    debug!(pid = child.id(), "launched background command");
    drop(child);

    Ok(ExecOutput {
        exit_code: 0,
        stdout: format!("Launched in background: {command}\n"),
        stderr: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn launch_returns_immediately_for_long_running_child() {
        let start = Instant::now();
        let out = launch("sh", "sleep 30").expect("spawn should succeed");
        assert!(
            start.elapsed() < Duration::from_secs(2),
            "launch blocked for {:?}",
            start.elapsed()
        );
        assert!(
            out.stdout.contains("Launched in background"),
            "got: {}",
            out.stdout
        );
        assert_eq!(out.exit_code, 0);
    }

    #[tokio::test]
    async fn launch_spawn_failure_is_reported() {
        let err = launch("/nonexistent/shell-binary", "true").expect_err("expected spawn failure");
        assert!(
            matches!(err, ExecError::SpawnFailure(_)),
            "expected SpawnFailure, got: {err}"
        );
    }
}
