// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("no session {0}")]
    SessionNotFound(String),
    #[error("session {0} is already initialized")]
    AlreadyInitialized(String),
    #[error(transparent)]
    Workflow(#[from] switchboard_workflow::WorkflowError),
    #[error("opening S2S session: {0}")]
    Open(anyhow::Error),
}
