//! Heuristic mapping from a raw command line to an execution mode.
//!
//! The mapping is a best-effort guess based on the base command name, its
//! flags, and the presence of shell redirection. Callers can always override
//! it with an explicit mode request.

use std::collections::HashSet;

use super::ExecMode;

/// Programs that take over the terminal and must run on a real pty.
const INTERACTIVE_COMMANDS: &[&str] = &[
    "ssh", "telnet", "ftp", "sftp", "vim", "vi", "nvim", "nano", "emacs", "less", "more", "man",
    "top", "htop", "watch", "python", "python3", "ipython", "node", "irb", "psql", "mysql",
    "sqlite3", "redis-cli", "sudo", "su", "passwd", "git", "docker", "kubectl", "apt", "apt-get",
    "yum", "dnf", "pacman", "tmux", "screen", "gdb",
];

/// Launchers that should detach rather than occupy the session.
const BACKGROUND_COMMANDS: &[&str] = &[
    "firefox", "chromium", "chrome", "google-chrome", "xdg-open", "open", "code", "gedit",
    "nautilus", "eog", "evince", "mpv", "vlc",
];

/// Flags that force a program into interactive behavior regardless of name.
const INTERACTIVE_FLAGS: &[&str] = &["-i", "--interactive", "-it", "--stdin"];

/// Resolves execution modes from command text.
///
/// Built from the compiled-in sets plus any extra names from configuration.
#[derive(Debug, Clone)]
pub struct Classifier {
    interactive: HashSet<String>,
    background: HashSet<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&[], &[])
    }
}

impl Classifier {
    /// Build a classifier, extending the built-in sets with extra command
    /// names from configuration.
    pub fn new(extra_interactive: &[String], extra_background: &[String]) -> Self {
        let mut interactive: HashSet<String> =
            INTERACTIVE_COMMANDS.iter().map(|s| s.to_string()).collect();
        interactive.extend(extra_interactive.iter().cloned());

        let mut background: HashSet<String> =
            BACKGROUND_COMMANDS.iter().map(|s| s.to_string()).collect();
        background.extend(extra_background.iter().cloned());

        Self {
            interactive,
            background,
        }
    }

    /// Map `command` to a concrete mode. Never returns [`ExecMode::Auto`].
    pub fn classify(&self, command: &str) -> ExecMode {
        let trimmed = command.trim();
        let Some(first) = trimmed.split_whitespace().next() else {
            return ExecMode::Captured;
        };
        let base = base_name(first);

        // Background wins over interactive: a launcher name means detach
        // even if someone also lists it as interactive.
        if self.background.contains(base) {
            return ExecMode::Background;
        }
        if self.interactive.contains(base) {
            return ExecMode::Interactive;
        }
        if trimmed
            .split_whitespace()
            .any(|tok| INTERACTIVE_FLAGS.contains(&tok))
        {
            return ExecMode::Interactive;
        }
        // Redirection or a pipe means the command feeds itself.
        if trimmed.contains('<') || trimmed.contains('>') || trimmed.contains('|') {
            return ExecMode::Captured;
        }
        ExecMode::Captured
    }
}

/// Strip any leading path component, so `/usr/bin/vim` classifies as `vim`.
fn base_name(token: &str) -> &str {
    token.rsplit('/').next().unwrap_or(token)
}
