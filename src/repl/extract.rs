//! Command extraction from assistant replies.
//!
//! Replies may carry runnable content three ways: fenced ```script blocks,
//! inline `>` script lines, and inline `!` shell lines. Extraction keeps
//! first-seen order and drops duplicates.

/// One runnable command found in a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// Multi-line script from a fenced block, indentation preserved.
    ScriptBlock(String),
    /// Single script line introduced by `>`.
    Script(String),
    /// Shell command introduced by `!`.
    Bash(String),
}

impl Extracted {
    pub fn text(&self) -> &str {
        match self {
            Self::ScriptBlock(s) | Self::Script(s) | Self::Bash(s) => s,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ScriptBlock(_) => "script block",
            Self::Script(_) => "script",
            Self::Bash(_) => "bash",
        }
    }
}

/// Pull runnable commands out of `response`, first-seen order, deduplicated.
pub fn extract_commands(response: &str) -> Vec<Extracted> {
    let mut found = Vec::new();

    // Fenced script blocks, keeping inner indentation.
    let mut block: Vec<&str> = Vec::new();
    let mut in_block = false;
    for line in response.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```script") {
            in_block = true;
        } else if trimmed == "```" && in_block {
            in_block = false;
            let body = block.join("\n");
            block.clear();
            if !body.trim().is_empty() {
                found.push(Extracted::ScriptBlock(body.trim_end().to_string()));
            }
        } else if in_block {
            block.push(line);
        }
    }

    // Inline lines are grouped by kind: every script line, then every bash
    // line, regardless of how they interleave in the reply.
    for line in response.lines() {
        if let Some(rest) = line.trim().strip_prefix('>') {
            let code = rest.trim();
            if !code.is_empty() {
                found.push(Extracted::Script(code.to_string()));
            }
        }
    }
    for line in response.lines() {
        if let Some(rest) = line.trim().strip_prefix('!') {
            let command = rest.trim();
            if !command.is_empty() && !command.starts_with('#') {
                found.push(Extracted::Bash(command.to_string()));
            }
        }
    }

    let mut unique = Vec::new();
    for item in found {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bash_and_script_lines() {
        let reply = "Try this:\n! ls -la\nthen\n> x = 5\n";
        let commands = extract_commands(reply);
        assert_eq!(
            commands,
            vec![
                Extracted::Script("x = 5".into()),
                Extracted::Bash("ls -la".into()),
            ]
        );
    }

    #[test]
    fn fenced_blocks_come_first_and_keep_lines() {
        let reply = "```script\na = 1\nb = a + 1\n```\n! echo done\n";
        let commands = extract_commands(reply);
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0], Extracted::ScriptBlock("a = 1\nb = a + 1".into()));
        assert_eq!(commands[1], Extracted::Bash("echo done".into()));
    }

    #[test]
    fn interleaved_lines_group_script_before_bash() {
        let reply = "! pwd\n> a = 1\n! ls\n> a + 1\n";
        let commands = extract_commands(reply);
        assert_eq!(
            commands,
            vec![
                Extracted::Script("a = 1".into()),
                Extracted::Script("a + 1".into()),
                Extracted::Bash("pwd".into()),
                Extracted::Bash("ls".into()),
            ]
        );
    }

    #[test]
    fn duplicates_are_dropped_preserving_first_position() {
        let reply = "! ls\n! pwd\n! ls\n";
        let commands = extract_commands(reply);
        assert_eq!(
            commands,
            vec![Extracted::Bash("ls".into()), Extracted::Bash("pwd".into())]
        );
    }

    #[test]
    fn shell_comments_are_not_commands() {
        let commands = extract_commands("! # just a note\n!\n");
        assert!(commands.is_empty());
    }

    #[test]
    fn empty_block_yields_nothing() {
        let commands = extract_commands("```script\n\n```\n");
        assert!(commands.is_empty());
    }

    #[test]
    fn prose_without_prefixes_yields_nothing() {
        let commands = extract_commands("List the files, then check disk usage.");
        assert!(commands.is_empty());
    }
}
