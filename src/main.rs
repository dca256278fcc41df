//! watchrun - re-run a command when files change
//!
//! Entry point for the watchrun binary.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use tokio_util::sync::CancellationToken;
use watchrun::observability::{init_tracing, TracingConfig};
use watchrun::{session, Command, Config, Result};

/// Re-run a command whenever files in the current directory change
#[derive(Parser, Debug)]
#[command(name = "watchrun")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "WATCHRUN_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "WATCHRUN_LOG_JSON")]
    log_json: bool,

    /// Do not run the command before the first change
    #[arg(long, env = "WATCHRUN_NO_INITIAL_RUN")]
    no_initial_run: bool,

    /// Command to run on change (default: go test)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&TracingConfig {
        level: cli.log_level.clone(),
        json: cli.log_json,
    });

    let config = Config {
        root: std::env::current_dir()?,
        command: Command::resolve(cli.command),
        run_on_start: !cli.no_initial_run,
        log_level: cli.log_level,
        ..Config::default()
    };

    tracing::debug!(?config, "Configuration loaded");
    config.validate()?;

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    session::run(config, shutdown).await?;
    Ok(())
}
