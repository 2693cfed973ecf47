//! CLI entry point for conch.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use conch::build_info;
use conch::cli;
use conch::config::{ensure_default_global_config, load_config};
use conch::exec::{Classifier, Engine};
use conch::repl::{NullResponder, Repl};
use conch::session::Session;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "conch=info".into()),
        )
        // Diagnostics go to stderr; stdout belongs to command output.
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = cli::Args::parse();

    if let Err(e) = ensure_default_global_config() {
        eprintln!("warning: failed to initialize ~/.config/conch/conch.toml: {e}");
    }

    let mut config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    // Apply CLI overrides.
    if let Some(shell) = &args.shell {
        config.exec.shell = shell.clone();
    }
    if let Some(secs) = args.timeout_secs {
        config.exec.captured_timeout_secs = secs;
    }

    let classifier = Classifier::new(
        &config.classify.extra_interactive,
        &config.classify.extra_background,
    );
    let engine = Engine::new(&config.exec.shell, config.captured_timeout(), classifier);

    // One-shot mode: run the command captured, print, exit with its code.
    if let Some(command) = &args.exec {
        let out = engine.run_captured_sync(command).await;
        print!("{}", out.stdout);
        eprint!("{}", out.stderr);
        std::process::exit(out.exit_code);
    }

    eprintln!("conch {}", build_info::startup_metadata_line());
    let session = match args.session_id {
        Some(id) => Session::with_id(id),
        None => Session::new(),
    };
    let mut repl = Repl::new(engine, session, NullResponder, config.history.context_limit);
    if let Err(e) = repl.run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
