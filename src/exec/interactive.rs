//! Interactive command execution on a real pseudo-terminal.
//!
//! Full-duplex programs (editors, pagers, password prompts, remote shells)
//! need a controlling terminal. The session spawns the shell on the slave
//! side of a pty pair and pumps bytes both ways between the real terminal
//! and the master side until the child exits.
//!
//! Everything here blocks; callers run a session on a worker thread. The
//! real terminal is an exclusive resource, so at most one session may be
//! live process-wide. That exclusion is enforced by the dispatch layer, not
//! here.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use portable_pty::{native_pty_system, CommandBuilder, MasterPty, PtySize};
use tracing::{debug, warn};

use crate::error::ExecError;

/// Poll interval for the forwarding loop.
const TICK: Duration = Duration::from_millis(10);

/// How long to keep draining master output after the child exits.
const DRAIN_WINDOW: Duration = Duration::from_millis(200);

/// Raw mode lifetime guard so terminal state is restored on any return path.
///
/// When stdin is not a terminal, raw mode cannot be entered; the session
/// still runs, it just skips the switch (and the restore on drop).
struct RawModeGuard {
    enabled: bool,
}

impl RawModeGuard {
    fn acquire() -> Self {
        match terminal::enable_raw_mode() {
            Ok(()) => Self { enabled: true },
            Err(e) => {
                debug!("raw mode unavailable: {e}");
                Self { enabled: false }
            }
        }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.enabled {
            let _ = terminal::disable_raw_mode();
        }
    }
}

fn pty_size() -> PtySize {
    let (cols, rows) = terminal::size().unwrap_or((80, 24));
    PtySize {
        rows,
        cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}

/// Run `command` under the system shell with a real controlling terminal.
///
/// Blocks until the child exits or `interrupt` is raised. Returns the
/// child's exit status; a raised interrupt kills the child and reports
/// [`ExecError::UserCancelled`]. The terminal's mode is restored on every
/// return path.
pub fn run_session(shell: &str, command: &str, interrupt: &AtomicBool) -> Result<i32, ExecError> {
    if command.trim().is_empty() {
        return Ok(0);
    }

    let pty_system = native_pty_system();
    let pair = pty_system
        .openpty(pty_size())
        .map_err(|e| ExecError::SpawnFailure(format!("openpty: {e}")))?;

    let mut builder = CommandBuilder::new(shell);
    builder.arg("-c");
    builder.arg(command);

    let mut child = pair
        .slave
        .spawn_command(builder)
        .map_err(|e| ExecError::SpawnFailure(format!("{shell}: {e}")))?;
    // The slave side belongs to the child now.
    drop(pair.slave);

    let mut reader = pair
        .master
        .try_clone_reader()
        .map_err(|e| ExecError::SpawnFailure(format!("pty reader: {e}")))?;
    let mut writer = pair
        .master
        .take_writer()
        .map_err(|e| ExecError::SpawnFailure(format!("pty writer: {e}")))?;

    let raw = RawModeGuard::acquire();

    // Dedicated reader thread for master output; the forwarding loop below
    // only does channel receives and short writes, so it stays responsive.
    let (out_tx, out_rx) = mpsc::channel::<Vec<u8>>();
    let output_pump = std::thread::spawn(move || {
        let mut chunk = [0u8; 4096];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if out_tx.send(chunk[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Keystrokes are taken from the terminal event queue inside the loop,
    // never from a blocking stdin read. Nothing keeps consuming terminal
    // input once the session ends. Without a terminal (raw mode failed)
    // there is no input to forward.
    let result = forward_loop(
        &mut child,
        &out_rx,
        &mut writer,
        pair.master.as_ref(),
        raw.enabled,
        interrupt,
    );

    // Closing the receiver lets the output pump finish once the master
    // side reaches EOF.
    drop(out_rx);
    let _ = output_pump.join();

    result
}

fn forward_loop(
    child: &mut Box<dyn portable_pty::Child + Send + Sync>,
    out_rx: &mpsc::Receiver<Vec<u8>>,
    writer: &mut Box<dyn Write + Send>,
    master: &dyn MasterPty,
    forward_input: bool,
    interrupt: &AtomicBool,
) -> Result<i32, ExecError> {
    let mut stdout = std::io::stdout();

    loop {
        if interrupt.load(Ordering::SeqCst) {
            warn!("interactive session interrupted");
            let _ = child.kill();
            let _ = child.wait();
            return Err(ExecError::UserCancelled);
        }

        // Master output to the real terminal.
        match out_rx.recv_timeout(TICK) {
            Ok(bytes) => {
                stdout.write_all(&bytes)?;
                stdout.flush()?;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            // EOF before exit; keep ticking until try_wait sees the child.
            Err(mpsc::RecvTimeoutError::Disconnected) => std::thread::sleep(TICK),
        }

        // Terminal events to the master. Ctrl+C travels through as 0x03
        // like any other byte; the child owns signal handling on its own
        // terminal.
        if forward_input {
            while event::poll(Duration::ZERO)? {
                match event::read()? {
                    Event::Key(key) => {
                        if let Some(bytes) = encode_key(&key) {
                            writer.write_all(&bytes)?;
                            writer.flush()?;
                        }
                    }
                    Event::Paste(text) => {
                        writer.write_all(text.as_bytes())?;
                        writer.flush()?;
                    }
                    Event::Resize(cols, rows) => {
                        let _ = master.resize(PtySize {
                            rows,
                            cols,
                            pixel_width: 0,
                            pixel_height: 0,
                        });
                    }
                    _ => {}
                }
            }
        }

        if let Some(status) = child
            .try_wait()
            .map_err(|e| ExecError::SpawnFailure(format!("wait: {e}")))?
        {
            drain_remaining(out_rx, &mut stdout);
            let code = i32::try_from(status.exit_code()).unwrap_or(-1);
            debug!(code, "interactive session finished");
            return Ok(code);
        }
    }
}

/// Translate one key event into the byte sequence a terminal would send.
///
/// Returns `None` for key releases and keys with no byte representation.
fn encode_key(key: &KeyEvent) -> Option<Vec<u8>> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let bytes = match key.code {
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() {
                vec![(c as u8) & 0x1f]
            } else {
                return None;
            }
        }
        KeyCode::Char(c) => c.to_string().into_bytes(),
        KeyCode::Enter => vec![b'\r'],
        KeyCode::Tab => vec![b'\t'],
        KeyCode::Backspace => vec![0x7f],
        KeyCode::Esc => vec![0x1b],
        KeyCode::Up => b"\x1b[A".to_vec(),
        KeyCode::Down => b"\x1b[B".to_vec(),
        KeyCode::Right => b"\x1b[C".to_vec(),
        KeyCode::Left => b"\x1b[D".to_vec(),
        KeyCode::Home => b"\x1b[H".to_vec(),
        KeyCode::End => b"\x1b[F".to_vec(),
        KeyCode::PageUp => b"\x1b[5~".to_vec(),
        KeyCode::PageDown => b"\x1b[6~".to_vec(),
        KeyCode::Delete => b"\x1b[3~".to_vec(),
        KeyCode::Insert => b"\x1b[2~".to_vec(),
        _ => return None,
    };
    Some(bytes)
}

/// After child exit the master may still hold buffered output; flush it out
/// within a bounded window.
fn drain_remaining(out_rx: &mpsc::Receiver<Vec<u8>>, stdout: &mut std::io::Stdout) {
    let deadline = Instant::now() + DRAIN_WINDOW;
    while Instant::now() < deadline {
        match out_rx.recv_timeout(TICK) {
            Ok(bytes) => {
                let _ = stdout.write_all(&bytes);
                let _ = stdout.flush();
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}
