// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! The error taxonomy, plus the propagation policy encoded in
//! `GatewayError::close_code`/`is_fatal`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("network error: {0}")]
    Network(#[from] std::io::Error),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
    #[error("unknown session: {0}")]
    UnknownSession(String),
    #[error("unknown agent: {0}")]
    UnknownAgent(String),
    #[error("agent unhealthy: {0}")]
    UnhealthyAgent(String),
    #[error("tool failure: {0}")]
    ToolFailure(String),
    #[error("invalid workflow transition: {0}")]
    WorkflowInvalidTransition(String),
    #[error("handoff failed: {0}")]
    HandoffFailed(String),
    #[error("circuit breaker tripped for {0}")]
    CircuitBreakerTripped(String),
    #[error("fatal internal error: {0}")]
    FatalInternal(String),
}

impl GatewayError {
    /// Whether this error should close the client connection outright
    ///.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GatewayError::ProtocolViolation(_)
                | GatewayError::UnknownSession(_)
                | GatewayError::FatalInternal(_)
                | GatewayError::CircuitBreakerTripped(_)
        )
    }
}

impl From<switchboard_memory::MemoryError> for GatewayError {
    fn from(e: switchboard_memory::MemoryError) -> Self {
        match e {
            switchboard_memory::MemoryError::UnknownSession(id) => GatewayError::UnknownSession(id),
        }
    }
}

impl From<switchboard_registry::ResolveError> for GatewayError {
    fn from(e: switchboard_registry::ResolveError) -> Self {
        match e {
            switchboard_registry::ResolveError::NotFound(id) => GatewayError::UnknownAgent(id),
            switchboard_registry::ResolveError::Unhealthy(id) => GatewayError::UnhealthyAgent(id),
            switchboard_registry::ResolveError::NoRoutingAgent => {
                GatewayError::Config("no routing agent registered".into())
            }
        }
    }
}

impl From<switchboard_io::IoError> for GatewayError {
    fn from(e: switchboard_io::IoError) -> Self {
        GatewayError::ProtocolViolation(e.to_string())
    }
}

impl From<tungstenite::Error> for GatewayError {
    fn from(e: tungstenite::Error) -> Self {
        GatewayError::Network(std::io::Error::other(e.to_string()))
    }
}
