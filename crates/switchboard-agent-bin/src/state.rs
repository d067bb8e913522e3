// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use switchboard_runtime::AgentCore;

/// Shared state threaded through the link server's axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub agent_id: String,
    pub core: Arc<AgentCore>,
}
