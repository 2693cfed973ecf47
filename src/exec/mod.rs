//! Command execution: mode classification, the three runners, and the async
//! dispatch layer that ties them into the REPL's event loop.
//!
//! `Background` and streaming `Captured` commands run natively on the async
//! runtime. `Interactive` commands block on real terminal I/O, so they are
//! offloaded to a worker thread and serialized behind a process-wide lock;
//! the controlling terminal cannot be multiplexed.

pub mod background;
pub mod captured;
pub mod classify;
pub mod interactive;

pub use captured::DEFAULT_CAPTURED_TIMEOUT;
pub use classify::Classifier;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::ExecError;

/// How a command should be run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Let the classifier decide.
    Auto,
    /// Real pty with the terminal handed to the child.
    Interactive,
    /// Piped execution with text capture.
    Captured,
    /// Detached launch, output discarded.
    Background,
}

/// One command invocation. Immutable once built.
#[derive(Debug, Clone)]
pub struct ExecRequest {
    pub command: String,
    pub mode: ExecMode,
}

impl ExecRequest {
    pub fn auto(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            mode: ExecMode::Auto,
        }
    }

    pub fn with_mode(command: impl Into<String>, mode: ExecMode) -> Self {
        Self {
            command: command.into(),
            mode,
        }
    }
}

/// Captured result of one invocation.
///
/// For interactive commands `stdout` carries a status line, not child
/// output; that already went straight to the terminal.
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Uniform async entry point over the three runners.
pub struct Engine {
    shell: String,
    captured_timeout: Duration,
    classifier: Classifier,
    // At most one pty session process-wide; later callers block here.
    pty_lock: Arc<Mutex<()>>,
    interrupt: Arc<AtomicBool>,
}

impl Engine {
    pub fn new(shell: impl Into<String>, captured_timeout: Duration, classifier: Classifier) -> Self {
        Self {
            shell: shell.into(),
            captured_timeout,
            classifier,
            pty_lock: Arc::new(Mutex::new(())),
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag observed by a running interactive session; raising it kills the
    /// child and cancels the session. Shared with the REPL's signal wiring.
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// Resolve `Auto` to a concrete mode; explicit requests pass through.
    pub fn resolve_mode(&self, req: &ExecRequest) -> ExecMode {
        match req.mode {
            ExecMode::Auto => self.classifier.classify(&req.command),
            explicit => explicit,
        }
    }

    /// Run one request and return its output. Never fails: every error is
    /// converted to textual output so the calling loop stays alive.
    pub async fn run(&self, req: &ExecRequest) -> ExecOutput {
        let mode = self.resolve_mode(req);
        debug!(command = %req.command, ?mode, "dispatching command");
        let result = match mode {
            ExecMode::Interactive => self.run_interactive(&req.command).await,
            ExecMode::Captured => captured::run_streaming(&self.shell, &req.command).await,
            ExecMode::Background => background::launch(&self.shell, &req.command),
            ExecMode::Auto => unreachable!("resolve_mode never yields Auto"),
        };
        match result {
            Ok(out) => out,
            Err(err) => error_output(err),
        }
    }

    /// Synchronous captured variant with the fixed timeout, for one-shot
    /// invocations outside the REPL loop.
    pub async fn run_captured_sync(&self, command: &str) -> ExecOutput {
        match captured::run_sync(&self.shell, command, self.captured_timeout).await {
            Ok(out) => out,
            Err(err) => error_output(err),
        }
    }

    async fn run_interactive(&self, command: &str) -> Result<ExecOutput, ExecError> {
        // First caller wins; later requests wait until the terminal is free.
        let _guard = self.pty_lock.lock().await;
        self.interrupt.store(false, Ordering::SeqCst);

        let shell = self.shell.clone();
        let command = command.to_string();
        let interrupt = Arc::clone(&self.interrupt);
        info!(%command, "starting interactive session");

        let code = tokio::task::spawn_blocking(move || {
            interactive::run_session(&shell, &command, &interrupt)
        })
        .await
        .map_err(|e| ExecError::SpawnFailure(format!("interactive worker: {e}")))??;

        if code == 0 {
            Ok(ExecOutput {
                exit_code: 0,
                stdout: "Interactive command completed\n".to_string(),
                stderr: String::new(),
            })
        } else {
            Err(ExecError::NonZeroExit(code))
        }
    }
}

/// Render an execution error as output text with a conventional exit code.
fn error_output(err: ExecError) -> ExecOutput {
    let exit_code = match &err {
        ExecError::SpawnFailure(_) => 127,
        ExecError::Timeout(_) => 124,
        ExecError::NonZeroExit(code) => *code,
        ExecError::UserCancelled => 130,
        ExecError::Io(_) => -1,
    };
    ExecOutput {
        exit_code,
        stdout: String::new(),
        stderr: format!("{err}\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        Engine::new("sh", DEFAULT_CAPTURED_TIMEOUT, Classifier::default())
    }

    #[test]
    fn resolve_mode_honors_explicit_requests() {
        let e = engine();
        let req = ExecRequest::with_mode("vim notes.txt", ExecMode::Captured);
        assert_eq!(e.resolve_mode(&req), ExecMode::Captured);
    }

    #[test]
    fn resolve_mode_classifies_auto_requests() {
        let e = engine();
        assert_eq!(
            e.resolve_mode(&ExecRequest::auto("vim notes.txt")),
            ExecMode::Interactive
        );
        assert_eq!(
            e.resolve_mode(&ExecRequest::auto("echo hi")),
            ExecMode::Captured
        );
    }

    #[tokio::test]
    async fn captured_command_output_round_trips() {
        let e = engine();
        let out = e.run(&ExecRequest::auto("echo hello")).await;
        assert!(out.success());
        assert_eq!(out.stdout, "hello\n");
    }

    #[tokio::test]
    async fn spawn_failure_becomes_text_not_panic() {
        let e = Engine::new(
            "/nonexistent/shell-binary",
            DEFAULT_CAPTURED_TIMEOUT,
            Classifier::default(),
        );
        let out = e
            .run(&ExecRequest::with_mode("true", ExecMode::Captured))
            .await;
        assert_eq!(out.exit_code, 127);
        assert!(out.stderr.contains("failed to spawn"), "got: {}", out.stderr);
    }

    #[tokio::test]
    async fn sync_timeout_becomes_text() {
        let e = Engine::new("sh", Duration::from_millis(50), Classifier::default());
        let out = e.run_captured_sync("sleep 5").await;
        assert_eq!(out.exit_code, 124);
        assert!(out.stderr.contains("timed out"), "got: {}", out.stderr);
    }

    #[tokio::test]
    async fn background_request_acknowledges_immediately() {
        let e = engine();
        let out = e
            .run(&ExecRequest::with_mode("sleep 30", ExecMode::Background))
            .await;
        assert!(out.success());
        assert!(
            out.stdout.contains("Launched in background"),
            "got: {}",
            out.stdout
        );
    }

    #[tokio::test]
    async fn interactive_nonzero_exit_becomes_text() {
        let e = engine();
        let out = e
            .run(&ExecRequest::with_mode("exit 3", ExecMode::Interactive))
            .await;
        assert_eq!(out.exit_code, 3);
        assert!(
            out.stderr.contains("exited with status 3"),
            "got: {}",
            out.stderr
        );
    }

    #[tokio::test]
    async fn interactive_success_reports_status_line() {
        let e = engine();
        let out = e
            .run(&ExecRequest::with_mode("true", ExecMode::Interactive))
            .await;
        assert!(out.success());
        assert!(
            out.stdout.contains("Interactive command completed"),
            "got: {}",
            out.stdout
        );
    }
}
