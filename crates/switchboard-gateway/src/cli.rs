// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "switchboard-gateway", about = "Session Gateway for agent-routed voice conversations")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gateway and serve client/agent WebSocket connections.
    Start {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the fully merged gateway configuration and exit.
    ShowConfig {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}
