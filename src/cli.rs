//! CLI argument parsing via clap.

use clap::Parser;

/// A shell session with command classification and inline scripting.
#[derive(Debug, Parser)]
#[command(name = "conch", version)]
pub struct Args {
    /// Run one command in captured mode and exit with its status.
    #[arg(short = 'e', long = "exec")]
    pub exec: Option<String>,

    /// Path to config file (default: ./conch.toml or ~/.config/conch/conch.toml).
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// Override the shell used to run commands.
    #[arg(short = 's', long = "shell")]
    pub shell: Option<String>,

    /// Override the captured-mode timeout in seconds.
    #[arg(short = 't', long = "timeout")]
    pub timeout_secs: Option<u64>,

    /// Session id to use instead of the timestamp-derived default.
    #[arg(long = "session-id")]
    pub session_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::Parser;

    #[test]
    fn one_shot_command_parses() {
        let args = Args::parse_from(["conch", "-e", "echo hi"]);
        assert_eq!(args.exec.as_deref(), Some("echo hi"));
    }

    #[test]
    fn overrides_parse() {
        let args = Args::parse_from(["conch", "-s", "/bin/zsh", "--timeout", "5"]);
        assert_eq!(args.shell.as_deref(), Some("/bin/zsh"));
        assert_eq!(args.timeout_secs, Some(5));
        assert!(args.exec.is_none());
    }

    #[test]
    fn session_id_parses() {
        let args = Args::parse_from(["conch", "--session-id", "session_demo"]);
        assert_eq!(args.session_id.as_deref(), Some("session_demo"));
    }
}
