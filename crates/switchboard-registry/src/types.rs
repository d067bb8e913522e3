// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::time::Instant;

use thiserror::Error;

pub type AgentId = String;

/// A live agent process, as known to the registry.
#[derive(Debug, Clone)]
pub struct Agent {
    pub agent_id: AgentId,
    pub endpoint: String,
    pub capabilities: Vec<String>,
    pub workflow_id: Option<String>,
    pub routing: bool,
    pub last_heartbeat: Instant,
}

impl Agent {
    pub fn is_healthy(&self, heartbeat_window: std::time::Duration) -> bool {
        self.last_heartbeat.elapsed() <= heartbeat_window
    }
}

/// Failure modes for `Resolve` and `Routing`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unknown agent: {0}")]
    NotFound(AgentId),
    #[error("agent unhealthy: {0}")]
    Unhealthy(AgentId),
    #[error("no routing agent registered")]
    NoRoutingAgent,
}
