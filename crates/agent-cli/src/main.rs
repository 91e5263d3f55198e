//! travel-agent
//!
//! Interactive planning agent. Spawns the tool server, prints the tools it
//! offers, then answers one query per line from stdin until `exit`/`quit`
//! or end of input.
//!
//! Exit status is non-zero only when the tool server cannot be reached at
//! startup or the connection breaks mid-session.

mod app;
mod args;

use std::process::ExitCode;

use clap::Parser;
use tokio::io::{stdin, stdout, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_runtime::RuntimeConfig;

use crate::args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env before clap reads env-backed flags
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the conversation
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_filter())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();

    // Configuration errors are reported and exit zero
    let mut config = match RuntimeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            println!("{}", e.user_message());
            return Ok(ExitCode::SUCCESS);
        }
    };
    cli.apply(&mut config);

    let outcome = app::run(&config, BufReader::new(stdin()), stdout(), interrupted()).await?;
    Ok(outcome.into())
}

/// Resolves on Ctrl-C. Never resolves when the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
