//! Embedded scripting with persistent session bindings.
//!
//! A snippet is first tried as a single expression; when it is not
//! syntactically an expression it is executed as statements instead. Both
//! paths share two name-to-value maps owned by the outer session, so
//! assignments persist across calls. Output and errors are captured per
//! call; a failing snippet produces error text, never a crash of the
//! session.

mod eval;
mod parser;
mod token;

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::error::ScriptError;

use eval::Evaluator;
use parser::Parser;

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Bool(_) => "bool",
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Self::Int(n) => *n != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::Bool(b) => *b,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// The two persistent name maps shared across one outer session.
///
/// Lookup checks locals first, then globals; assignment always writes
/// locals. No locking: invocations within one session are never concurrent.
#[derive(Debug, Default)]
pub struct ScriptBindings {
    pub globals: HashMap<String, Value>,
    pub locals: HashMap<String, Value>,
}

impl ScriptBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.locals.get(name).or_else(|| self.globals.get(name))
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.locals.insert(name.to_string(), value);
    }

    pub fn set_global(&mut self, name: &str, value: Value) {
        self.globals.insert(name.to_string(), value);
    }
}

/// Captured output of one evaluation call.
#[derive(Debug, Default, PartialEq)]
pub struct ScriptOutcome {
    pub stdout: String,
    pub stderr: String,
}

/// Evaluate one snippet against the session's bindings.
///
/// Expression results are echoed to the captured stdout; statement
/// execution only emits what `print` produces. All failures are rendered
/// into the captured stderr as `Error: ...`.
pub fn evaluate(code: &str, bindings: &mut ScriptBindings) -> ScriptOutcome {
    let mut outcome = ScriptOutcome::default();
    match run(code, bindings, &mut outcome.stdout) {
        Ok(()) => {}
        Err(err) => {
            debug!("script evaluation failed: {err}");
            outcome.stderr.push_str(&format!("Error: {err}\n"));
        }
    }
    outcome
}

fn run(code: &str, bindings: &mut ScriptBindings, out: &mut String) -> Result<(), ScriptError> {
    let tokens = token::tokenize(code)?;
    let mut evaluator = Evaluator::new(bindings, out);

    // Expression first; fall back to statements when the snippet is not a
    // lone expression.
    if let Ok(expr) = Parser::new(&tokens).parse_single_expression() {
        if let Some(value) = evaluator.eval_expr(&expr)? {
            let rendered = value.to_string();
            evaluator.emit_line(&rendered);
        }
        return Ok(());
    }

    let stmts = Parser::new(&tokens).parse_program()?;
    for stmt in &stmts {
        evaluator.exec_stmt(stmt)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_fresh(code: &str) -> ScriptOutcome {
        let mut bindings = ScriptBindings::new();
        evaluate(code, &mut bindings)
    }

    #[test]
    fn expression_result_is_echoed() {
        let out = eval_fresh("1 + 2 * 3");
        assert_eq!(out.stdout, "7\n");
        assert_eq!(out.stderr, "");
    }

    #[test]
    fn bindings_persist_across_calls() {
        let mut bindings = ScriptBindings::new();
        let first = evaluate("x = 5", &mut bindings);
        assert_eq!(first.stdout, "");
        assert_eq!(first.stderr, "");

        let second = evaluate("x + 1", &mut bindings);
        assert_eq!(second.stdout, "6\n");
    }

    #[test]
    fn lookup_prefers_locals_over_globals() {
        let mut bindings = ScriptBindings::new();
        bindings.set_global("x", Value::Int(1));
        bindings.set("x", Value::Int(2));
        let out = evaluate("x", &mut bindings);
        assert_eq!(out.stdout, "2\n");
    }

    #[test]
    fn globals_visible_when_no_local_shadows() {
        let mut bindings = ScriptBindings::new();
        bindings.set_global("greeting", Value::Str("hi".into()));
        let out = evaluate("greeting", &mut bindings);
        assert_eq!(out.stdout, "hi\n");
    }

    #[test]
    fn undefined_name_is_error_text_not_panic() {
        let out = eval_fresh("nope + 1");
        assert_eq!(out.stdout, "");
        assert!(
            out.stderr.contains("Error:") && out.stderr.contains("nope"),
            "got: {}",
            out.stderr
        );
    }

    #[test]
    fn statements_run_in_order() {
        let out = eval_fresh("a = 2\nb = a * 10\nprint(b)");
        assert_eq!(out.stdout, "20\n");
    }

    #[test]
    fn semicolons_separate_statements() {
        let out = eval_fresh("a = 1; b = 2; print(a + b)");
        assert_eq!(out.stdout, "3\n");
    }

    #[test]
    fn division_by_zero_is_caught() {
        let out = eval_fresh("1 / 0");
        assert!(out.stderr.contains("division by zero"), "got: {}", out.stderr);
    }

    #[test]
    fn parse_error_is_reported_as_text() {
        let out = eval_fresh("x = = 3");
        assert!(out.stderr.starts_with("Error:"), "got: {}", out.stderr);
    }

    #[test]
    fn string_concatenation_and_builtins() {
        let out = eval_fresh("s = \"ab\" + \"cd\"\nprint(len(s))\nprint(s)");
        assert_eq!(out.stdout, "4\nabcd\n");
    }

    #[test]
    fn comparisons_yield_booleans() {
        assert_eq!(eval_fresh("3 > 2").stdout, "true\n");
        assert_eq!(eval_fresh("2 == 3").stdout, "false\n");
    }

    #[test]
    fn error_leaves_earlier_assignments_intact() {
        let mut bindings = ScriptBindings::new();
        evaluate("x = 41", &mut bindings);
        let bad = evaluate("y = x / 0", &mut bindings);
        assert!(bad.stderr.contains("Error:"));
        let after = evaluate("x + 1", &mut bindings);
        assert_eq!(after.stdout, "42\n");
    }
}
