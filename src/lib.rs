//! Conch — a shell session that classifies commands, runs them the right
//! way, and keeps an inline scripting environment alongside.
//!
//! Commands are classified as interactive (real pty, terminal handed to the
//! child), captured (piped, output recorded), or background (detached
//! launch). A small expression language shares state across the session, and
//! recent output is kept as context for assistant queries.
//!
//! # Quick start
//!
//! ```no_run
//! use conch::config::load_config;
//! use conch::exec::{Classifier, Engine, ExecRequest};
//!
//! # async fn example() {
//! let config = load_config(None).unwrap();
//! let classifier = Classifier::new(
//!     &config.classify.extra_interactive,
//!     &config.classify.extra_background,
//! );
//! let engine = Engine::new(&config.exec.shell, config.captured_timeout(), classifier);
//! let out = engine.run(&ExecRequest::auto("echo hello")).await;
//! println!("{}", out.stdout);
//! # }
//! ```

pub mod build_info;
pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod history;
pub mod repl;
pub mod script;
pub mod session;
pub mod textutil;
