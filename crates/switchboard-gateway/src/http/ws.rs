// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Client-facing WebSocket endpoint: upgrades the
//! connection, then hands it to a `SessionActor` for the rest of its life.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::Response;
use tracing::warn;

use crate::session::SessionActor;
use crate::state::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| async move {
        match SessionActor::accept(state, socket).await {
            Ok(actor) => actor.run().await,
            Err(e) => warn!("session setup failed: {e}"),
        }
    })
}
