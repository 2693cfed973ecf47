//! Per-run session state: identity, output history, and script bindings.
//!
//! One session spans one REPL run. The output history and the scripting
//! bindings live exactly as long as the session; nothing here persists to
//! disk.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::history::{OutputHistory, OutputKind};
use crate::script::ScriptBindings;

/// Shared state for one outer session.
#[derive(Debug)]
pub struct Session {
    id: String,
    pub history: OutputHistory,
    pub bindings: ScriptBindings,
}

impl Session {
    /// A fresh session with a timestamp-derived id.
    pub fn new() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self::with_id(format!("session_{secs}"))
    }

    /// Resume under a caller-chosen id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            history: OutputHistory::new(),
            bindings: ScriptBindings::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn record(&mut self, kind: OutputKind, content: &str) {
        self.history.record(kind, content);
    }

    pub fn recent_context(&self, limit: usize) -> String {
        self.history.recent_context(limit)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
