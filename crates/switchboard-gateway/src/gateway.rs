// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Gateway startup — assembles the Session Gateway (C7), Agent Registry
//! (C2), and Session Memory Store (C1), then serves them over one Axum
//! router until shutdown.
//!
//! # Startup sequence
//!
//! [`run`] performs these steps, then blocks on the HTTP server:
//!
//! 1. Build `AppState` (an empty `MemoryStore` + `AgentRegistry`).
//! 2. Mount `/ws` (client sessions) and `/agents/*` (agent registration).
//! 3. Serve until Ctrl+C.

use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use switchboard_config::GatewayConfig;

use crate::http::ws::ws_handler;
use crate::registration::{deregister, heartbeat, register};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/agents/register", post(register))
        .route("/agents/:agent_id/heartbeat", post(heartbeat))
        .route("/agents/:agent_id", axum::routing::delete(deregister))
        .with_state(state)
}

/// Start the gateway. Runs until Ctrl+C or SIGTERM.
pub async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    let bind = config.bind.clone();
    let state = AppState::new(config);
    let router = build_router(state);

    info!(%bind, "switchboard-gateway listening");
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("install Ctrl+C handler");
    };
    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}
