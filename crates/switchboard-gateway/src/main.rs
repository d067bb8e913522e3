// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod circuit;
mod cli;
mod error;
mod gateway;
mod handoff;
mod http;
mod registration;
mod session;
mod state;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Start { config } => {
            let cfg = switchboard_config::load(config.as_deref())?;
            gateway::run(cfg.gateway).await
        }
        Commands::ShowConfig { config } => {
            let cfg = switchboard_config::load(config.as_deref())?;
            println!("{}", serde_yaml::to_string(&cfg)?);
            Ok(())
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
