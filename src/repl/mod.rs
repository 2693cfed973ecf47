//! Interactive line loop: prefix dispatch, assistant queries, and the
//! approval flow for commands extracted from assistant replies.
//!
//! The loop itself never unwinds on a bad command; execution errors come
//! back from the engine as text and are printed like any other output.

pub mod extract;

pub use extract::{extract_commands, Extracted};

use std::fmt;
use std::io::Write as _;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

use crate::exec::{Engine, ExecMode, ExecRequest};
use crate::history::OutputKind;
use crate::script;
use crate::session::Session;
use crate::textutil;

const PROMPT: &str = "conch> ";

const HELP_TEXT: &str = "\
Commands:
  > <expr>          evaluate a script expression or statement
  ! <command>       run a shell command (mode chosen automatically)
  !i <command>      force interactive mode (real terminal)
  !c <command>      force captured mode (output recorded)
  ?? <question>     ask the assistant, with recent output as context
  ask <question>    same as ??
  task: <goal>      ask the assistant for commands to accomplish a goal
  help              show this help
  exit, quit        leave the session

Anything else is run as a shell command.
";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Script(String),
    Bash { command: String, mode: ExecMode },
    Query(String),
    Task(String),
    Help,
    Exit,
    Empty,
}

/// Map a raw input line to a command. Pure; the loop applies the effects.
pub fn parse_line(line: &str) -> ReplCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ReplCommand::Empty;
    }
    match trimmed {
        "exit" | "quit" | "exit()" | "quit()" => return ReplCommand::Exit,
        "help" => return ReplCommand::Help,
        _ => {}
    }
    // `ask` is an alias for `??`; both queries carry recent context.
    if let Some(rest) = trimmed.strip_prefix("??") {
        return ReplCommand::Query(rest.trim().to_string());
    }
    if let Some(rest) = trimmed.strip_prefix("ask ") {
        return ReplCommand::Query(rest.trim().to_string());
    }
    if let Some(rest) = trimmed.strip_prefix("task:") {
        return ReplCommand::Task(rest.trim().to_string());
    }
    if let Some(rest) = trimmed.strip_prefix('>') {
        return ReplCommand::Script(rest.trim().to_string());
    }
    if let Some(rest) = trimmed.strip_prefix("!i ") {
        return ReplCommand::Bash {
            command: rest.trim().to_string(),
            mode: ExecMode::Interactive,
        };
    }
    if let Some(rest) = trimmed.strip_prefix("!c ") {
        return ReplCommand::Bash {
            command: rest.trim().to_string(),
            mode: ExecMode::Captured,
        };
    }
    if let Some(rest) = trimmed.strip_prefix('!') {
        return ReplCommand::Bash {
            command: rest.trim().to_string(),
            mode: ExecMode::Auto,
        };
    }
    // Bare lines are shell commands; the REPL is a shell first.
    ReplCommand::Bash {
        command: trimmed.to_string(),
        mode: ExecMode::Auto,
    }
}

/// Answer chosen at the approval prompt after commands are extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalChoice {
    All,
    None,
    Index(usize),
    Invalid,
}

/// Parse one approval-prompt answer against `count` listed commands.
/// Indexes are 1-based on the wire, 0-based in the result.
pub fn parse_approval_choice(input: &str, count: usize) -> ApprovalChoice {
    let trimmed = input.trim();
    match trimmed {
        "" | "none" | "n" => return ApprovalChoice::None,
        "all" | "a" => return ApprovalChoice::All,
        _ => {}
    }
    match trimmed.parse::<usize>() {
        Ok(n) if n >= 1 && n <= count => ApprovalChoice::Index(n - 1),
        _ => ApprovalChoice::Invalid,
    }
}

#[derive(Debug)]
pub struct ResponderError(pub String);

impl fmt::Display for ResponderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ResponderError {}

/// Backend that answers natural-language queries. The loop only needs the
/// reply text; command extraction happens on this side.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, query: &str, context: &str) -> Result<String, ResponderError>;
}

/// Stand-in used when no assistant backend is configured.
pub struct NullResponder;

#[async_trait]
impl Responder for NullResponder {
    async fn respond(&self, _query: &str, _context: &str) -> Result<String, ResponderError> {
        Err(ResponderError(
            "no assistant backend is configured".to_string(),
        ))
    }
}

/// The line loop. Owns the session; borrows nothing across awaits.
pub struct Repl<R: Responder> {
    engine: Engine,
    session: Session,
    responder: R,
    context_limit: usize,
}

impl<R: Responder> Repl<R> {
    pub fn new(engine: Engine, session: Session, responder: R, context_limit: usize) -> Self {
        Self {
            engine,
            session,
            responder,
            context_limit,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Read lines from stdin until exit or end of input.
    pub async fn run(&mut self) -> std::io::Result<()> {
        println!("conch session {} (type 'help' for commands)", self.session.id());
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("{PROMPT}");
            std::io::stdout().flush()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            match parse_line(&line) {
                ReplCommand::Empty => {}
                ReplCommand::Exit => break,
                ReplCommand::Help => print!("{HELP_TEXT}"),
                ReplCommand::Script(code) => self.handle_script(&code),
                ReplCommand::Bash { command, mode } => self.handle_bash(&command, mode).await,
                ReplCommand::Query(text) => {
                    self.handle_query(&text, &mut lines).await?;
                }
                ReplCommand::Task(goal) => self.handle_task(&goal, &mut lines).await?,
            }
        }
        Ok(())
    }

    fn handle_script(&mut self, code: &str) {
        let outcome = script::evaluate(code, &mut self.session.bindings);
        if !outcome.stdout.is_empty() {
            print!("{}", outcome.stdout);
            self.session.record(OutputKind::ScriptStdout, &outcome.stdout);
        }
        if !outcome.stderr.is_empty() {
            eprint!("{}", outcome.stderr);
            self.session.record(OutputKind::ScriptStderr, &outcome.stderr);
        }
    }

    async fn handle_bash(&mut self, command: &str, mode: ExecMode) {
        let req = ExecRequest::with_mode(command, mode);
        let resolved = self.engine.resolve_mode(&req);
        let out = self.engine.run(&req).await;
        match resolved {
            ExecMode::Captured => {
                // The streaming runner already echoed child output live. The
                // one un-echoed case is a spawn failure, which produces only
                // synthetic stderr text.
                if out.exit_code == 127 && out.stdout.is_empty() {
                    eprint!("{}", out.stderr);
                }
            }
            _ => {
                if !out.stdout.is_empty() {
                    print!("{}", out.stdout);
                }
                if !out.stderr.is_empty() {
                    eprint!("{}", out.stderr);
                }
            }
        }
        self.session.record(OutputKind::BashStdout, &out.stdout);
        self.session.record(OutputKind::BashStderr, &out.stderr);
    }

    async fn handle_query(
        &mut self,
        query: &str,
        lines: &mut Lines<BufReader<Stdin>>,
    ) -> std::io::Result<()> {
        let context = self.session.recent_context(self.context_limit);
        debug!(context_bytes = context.len(), "sending query");
        match self.responder.respond(query, &context).await {
            Ok(reply) => {
                println!("{reply}");
                self.session.record(OutputKind::Assistant, &reply);
                let commands = extract_commands(&reply);
                if !commands.is_empty() {
                    self.prompt_command_execution(&commands, lines).await?;
                }
            }
            Err(err) => eprintln!("Error: {err}"),
        }
        Ok(())
    }

    async fn handle_task(
        &mut self,
        goal: &str,
        lines: &mut Lines<BufReader<Stdin>>,
    ) -> std::io::Result<()> {
        let framed = format!(
            "Accomplish this task. Reply with the shell or script commands to run:\n{goal}"
        );
        self.handle_query(&framed, lines).await
    }

    /// List extracted commands and run the ones the user picks. A number runs
    /// one command and asks again; 'all' and 'none' end the prompt.
    async fn prompt_command_execution(
        &mut self,
        commands: &[Extracted],
        lines: &mut Lines<BufReader<Stdin>>,
    ) -> std::io::Result<()> {
        println!("\nThe reply contains {} runnable command(s):", commands.len());
        for (i, item) in commands.iter().enumerate() {
            let preview = textutil::preview_line(item.text(), 72);
            println!("  {}. [{}] {}", i + 1, item.label(), preview);
        }
        loop {
            print!("Run which? (number, 'all', 'none'): ");
            std::io::stdout().flush()?;
            let Some(answer) = lines.next_line().await? else {
                break;
            };
            match parse_approval_choice(&answer, commands.len()) {
                ApprovalChoice::None => break,
                ApprovalChoice::All => {
                    for item in commands {
                        self.execute_extracted(item).await;
                    }
                    break;
                }
                ApprovalChoice::Index(i) => self.execute_extracted(&commands[i]).await,
                ApprovalChoice::Invalid => {
                    println!("Enter a number between 1 and {}, 'all', or 'none'.", commands.len());
                }
            }
        }
        Ok(())
    }

    async fn execute_extracted(&mut self, item: &Extracted) {
        match item {
            Extracted::ScriptBlock(code) | Extracted::Script(code) => self.handle_script(code),
            Extracted::Bash(command) => self.handle_bash(command, ExecMode::Auto).await,
        }
    }
}
