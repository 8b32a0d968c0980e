mod builtins;
mod completion;
mod config;
mod dispatch;
mod error;
mod history;
mod input;
mod parser;
mod repl;

use anyhow::{Context, Result};
use config::Config;
use dispatch::ProcessDispatcher;
use repl::Shell;
use tracing_subscriber::EnvFilter;

fn main() {
    init_logging();
    if let Err(err) = run() {
        eprintln!("dsh: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = Config::from_env().context("bad configuration")?;
    tracing::debug!(?config, "starting");
    let mut source = input::open()?;
    let dispatcher = ProcessDispatcher::new(config.reap_background);
    let mut shell = Shell::new(config, dispatcher, std::io::stdout());
    shell.run(source.as_mut())
}

/// Diagnostics go to stderr, filtered by `DSH_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_env("DSH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
