// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error(transparent)]
    Runtime(#[from] switchboard_runtime::RuntimeError),
    #[error("frame {0} requires a sessionId but none was present")]
    MissingSessionId(String),
    #[error("frame type {0} is not valid on this link")]
    Unexpected(String),
    #[error("decoding frame: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Transport(#[from] tungstenite::Error),
}
