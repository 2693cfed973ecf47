//! Configuration loading from TOML files and environment variables.
//!
//! Config is loaded in this order of precedence (highest wins):
//! 1. Environment variables (`CONCH_SHELL`, `CONCH_TIMEOUT_SECS`)
//! 2. TOML file specified via --config CLI flag
//! 3. ./conch.toml in the current directory
//! 4. $XDG_CONFIG_HOME/conch/conch.toml (or ~/.config/conch/conch.toml)
//! 5. Built-in defaults

use crate::error::ConfigError;
use serde::Deserialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONCH_CONFIG_TEMPLATE: &str = include_str!("templates/conch.toml");
const DEFAULT_SHELL: &str = "/bin/bash";
const DEFAULT_CAPTURED_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONTEXT_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub exec: ExecConfig,
    pub classify: ClassifyConfig,
    pub history: HistoryConfig,
}

impl Config {
    pub fn captured_timeout(&self) -> Duration {
        Duration::from_secs(self.exec.captured_timeout_secs)
    }
}

/// Command execution settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// Shell invoked with `-c <command>` for every execution mode.
    pub shell: String,
    /// Time bound for the synchronous captured runner.
    pub captured_timeout_secs: u64,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            shell: DEFAULT_SHELL.into(),
            captured_timeout_secs: DEFAULT_CAPTURED_TIMEOUT_SECS,
        }
    }
}

/// Extensions to the built-in classifier sets.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Extra command names treated as interactive.
    pub extra_interactive: Vec<String>,
    /// Extra command names treated as background launchers.
    pub extra_background: Vec<String>,
}

/// Output history settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// How many recent entries feed the assistant's context.
    pub context_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            context_limit: DEFAULT_CONTEXT_LIMIT,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load configuration from disk and environment.
///
/// `path_override` is an explicit config file path (from --config flag).
pub fn load_config(path_override: Option<&str>) -> Result<Config, ConfigError> {
    let config_text = if let Some(p) = path_override {
        // Explicit path fails loudly when missing.
        std::fs::read_to_string(p)?
    } else if let Ok(text) = std::fs::read_to_string("conch.toml") {
        text
    } else if let Some(dir) = config_root_dir() {
        let global = dir.join("conch").join("conch.toml");
        std::fs::read_to_string(global).unwrap_or_default()
    } else {
        String::new()
    };

    let mut config: Config = toml::from_str(&config_text)?;

    if let Ok(shell) = std::env::var("CONCH_SHELL") {
        let trimmed = shell.trim();
        if !trimmed.is_empty() {
            config.exec.shell = trimmed.to_string();
        }
    }
    if let Ok(timeout) = std::env::var("CONCH_TIMEOUT_SECS") {
        let parsed = timeout.parse::<u64>().map_err(|_| {
            ConfigError::Invalid(format!(
                "invalid CONCH_TIMEOUT_SECS value `{timeout}`: expected positive integer seconds"
            ))
        })?;
        config.exec.captured_timeout_secs = parsed;
    }

    validate(&config)?;
    Ok(config)
}

/// Reject configurations that cannot produce a working session.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.exec.shell.trim().is_empty() {
        return Err(ConfigError::Invalid("exec.shell must not be empty".into()));
    }
    if config.exec.captured_timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "exec.captured_timeout_secs must be positive".into(),
        ));
    }
    if config.history.context_limit == 0 {
        return Err(ConfigError::Invalid(
            "history.context_limit must be positive".into(),
        ));
    }
    Ok(())
}

/// Return the default per-user config path (`~/.config/conch/conch.toml`).
pub fn default_global_config_path() -> Option<PathBuf> {
    config_root_dir().map(|dir| dir.join("conch").join("conch.toml"))
}

/// Ensure the default global config file exists.
///
/// Returns the global config path when available on this platform.
pub fn ensure_default_global_config() -> Result<Option<PathBuf>, ConfigError> {
    let Some(path) = default_global_config_path() else {
        return Ok(None);
    };
    ensure_default_global_config_at_path(&path)?;
    Ok(Some(path))
}

fn ensure_default_global_config_at_path(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // create_new avoids clobbering an existing file if another process won the race.
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            file.write_all(DEFAULT_CONCH_CONFIG_TEMPLATE.as_bytes())?;
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(ConfigError::Io(e)),
    }
}

pub fn config_root_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".config"))
        .or_else(dirs::config_dir)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_text: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(toml_text)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn defaults_are_sensible() {
        let c = Config::default();
        assert_eq!(c.exec.shell, "/bin/bash");
        assert_eq!(c.exec.captured_timeout_secs, 30);
        assert_eq!(c.history.context_limit, 10);
        assert!(c.classify.extra_interactive.is_empty());
        assert!(c.classify.extra_background.is_empty());
    }

    #[test]
    fn parse_partial_toml() {
        let c = parse(
            r#"
            [exec]
            shell = "/bin/zsh"

            [classify]
            extra_interactive = ["mytui"]
        "#,
        )
        .unwrap();
        assert_eq!(c.exec.shell, "/bin/zsh");
        assert_eq!(c.exec.captured_timeout_secs, 30);
        assert_eq!(c.classify.extra_interactive, vec!["mytui"]);
    }

    #[test]
    fn parse_empty_string_gives_defaults() {
        let c = parse("").unwrap();
        assert_eq!(c.exec.shell, "/bin/bash");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = parse(
            r#"
            [exec]
            captured_timeout_secs = 0
        "#,
        )
        .unwrap_err();
        assert!(
            err.to_string().contains("captured_timeout_secs"),
            "got: {err}"
        );
    }

    #[test]
    fn empty_shell_is_rejected() {
        let err = parse(
            r#"
            [exec]
            shell = "  "
        "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("exec.shell"), "got: {err}");
    }

    #[test]
    fn captured_timeout_converts_to_duration() {
        let c = parse(
            r#"
            [exec]
            captured_timeout_secs = 5
        "#,
        )
        .unwrap();
        assert_eq!(c.captured_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn template_parses_and_validates() {
        parse(DEFAULT_CONCH_CONFIG_TEMPLATE).expect("bundled template must be valid");
    }

    #[test]
    fn ensure_default_global_config_writes_template() {
        let tmp_root = std::env::temp_dir().join(format!(
            "conch-config-test-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let path = tmp_root.join("conch").join("conch.toml");

        ensure_default_global_config_at_path(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, DEFAULT_CONCH_CONFIG_TEMPLATE);

        std::fs::remove_file(&path).unwrap();
        std::fs::remove_dir_all(&tmp_root).unwrap();
    }
}
