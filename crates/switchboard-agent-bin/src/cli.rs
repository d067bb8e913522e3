// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "switchboard-agent", about = "Agent process: one persona, one workflow, many sessions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the agent process: register with the gateway and serve the
    /// gateway-facing link.
    Start {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the fully merged agent configuration and exit.
    ShowConfig {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}
