// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! HTTP control-plane routes agent processes use to join the registry and
//! stay live.

use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use switchboard_registry::Agent;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub agent_id: String,
    pub endpoint: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub workflow_id: Option<String>,
    #[serde(default)]
    pub routing: bool,
}

pub async fn register(State(state): State<AppState>, Json(req): Json<RegisterRequest>) -> StatusCode {
    info!(agent_id = %req.agent_id, endpoint = %req.endpoint, "agent registering");
    state.registry.register(Agent {
        agent_id: req.agent_id,
        endpoint: req.endpoint,
        capabilities: req.capabilities,
        workflow_id: req.workflow_id,
        routing: req.routing,
        last_heartbeat: Instant::now(),
    });
    StatusCode::NO_CONTENT
}

pub async fn heartbeat(State(state): State<AppState>, Path(agent_id): Path<String>) -> StatusCode {
    state.registry.heartbeat(&agent_id);
    StatusCode::NO_CONTENT
}

pub async fn deregister(State(state): State<AppState>, Path(agent_id): Path<String>) -> StatusCode {
    state.registry.deregister(&agent_id);
    StatusCode::NO_CONTENT
}
