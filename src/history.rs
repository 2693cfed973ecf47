//! Bounded history of captured output.
//!
//! Every piece of output the session produces, whether a command stream, a
//! script buffer, or an assistant reply, lands here. The buffer is capped;
//! once full, the oldest entries are evicted first.

use std::collections::VecDeque;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::textutil;

/// Maximum number of retained entries.
pub const HISTORY_CAP: usize = 1000;

/// Byte limit applied to each entry when rendered into context.
const CONTEXT_ENTRY_LIMIT: usize = 2048;

/// What produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    BashStdout,
    BashStderr,
    ScriptStdout,
    ScriptStderr,
    Assistant,
}

impl OutputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BashStdout => "bash_stdout",
            Self::BashStderr => "bash_stderr",
            Self::ScriptStdout => "script_stdout",
            Self::ScriptStderr => "script_stderr",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded piece of output.
#[derive(Debug, Clone)]
pub struct OutputEntry {
    /// Milliseconds since the Unix epoch at record time.
    pub timestamp_ms: u64,
    pub kind: OutputKind,
    pub content: String,
}

/// FIFO-bounded output log.
#[derive(Debug, Default)]
pub struct OutputHistory {
    entries: VecDeque<OutputEntry>,
}

impl OutputHistory {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Record one entry, evicting the oldest when at capacity.
    ///
    /// Empty content is skipped; a command with no output leaves no trace.
    pub fn record(&mut self, kind: OutputKind, content: &str) {
        if content.is_empty() {
            return;
        }
        if self.entries.len() >= HISTORY_CAP {
            self.entries.pop_front();
        }
        self.entries.push_back(OutputEntry {
            timestamp_ms: now_ms(),
            kind,
            content: content.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recent `limit` entries, oldest first.
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &OutputEntry> {
        let skip = self.entries.len().saturating_sub(limit);
        self.entries.iter().skip(skip)
    }

    /// Render the most recent `limit` entries as context lines, one entry per
    /// line in the form `[<millis>] <kind>: <content>`.
    pub fn recent_context(&self, limit: usize) -> String {
        let mut out = String::new();
        for entry in self.recent(limit) {
            let content = textutil::clip_with_marker(entry.content.trim_end(), CONTEXT_ENTRY_LIMIT);
            out.push_str(&format!(
                "[{}] {}: {}\n",
                entry.timestamp_ms, entry.kind, content
            ));
        }
        out
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
