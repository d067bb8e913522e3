// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod catalog;
mod cli;
mod link;
mod registration;
mod s2s_ws;
mod state;
mod tools_http;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use state::AppState;
use switchboard_config::AgentProcessConfig;
use switchboard_runtime::AgentCore;
use switchboard_tools::Dispatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Start { config } => {
            let cfg = switchboard_config::load(config.as_deref())?;
            run(cfg.agent).await
        }
        Commands::ShowConfig { config } => {
            let cfg = switchboard_config::load(config.as_deref())?;
            println!("{}", serde_yaml::to_string(&cfg)?);
            Ok(())
        }
    }
}

async fn run(cfg: AgentProcessConfig) -> anyhow::Result<()> {
    anyhow::ensure!(!cfg.agent_id.is_empty(), "agent.agent_id must be set");
    let workflow_file = cfg
        .workflow_file
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("agent.workflow_file must be set"))?;
    let persona_file = cfg
        .persona_file
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("agent.persona_file must be set"))?;

    let workflow = Arc::new(switchboard_workflow::load_workflow(workflow_file)?);
    let workflow_id = workflow.id.clone();
    let persona = Arc::new(switchboard_runtime::load_persona(persona_file)?);

    let tool_catalog = match &cfg.tools_catalog_file {
        Some(path) => catalog::load_catalog(path, &cfg.tool_scopes, &cfg.idv_tool_names)?,
        None => Vec::new(),
    };

    let tools_client = Arc::new(tools_http::HttpToolsClient::new(
        cfg.tools_endpoint.clone(),
        Duration::from_millis(cfg.tool_timeout_ms),
    )?);
    let dispatcher = Arc::new(Dispatcher::new(
        tools_client,
        cfg.routing_agent_id.clone(),
        cfg.idv_tool_names.clone(),
        cfg.cacheable_tool_names.clone(),
    ));

    let s2s_client = Arc::new(s2s_ws::WsS2SClient::new(cfg.s2s_endpoint.clone()));

    let core = Arc::new(AgentCore::new(
        cfg.agent_id.clone(),
        cfg.routing_agent_id.clone(),
        cfg.routing,
        cfg.auto_trigger_enabled,
        cfg.voice_preset.clone(),
        s2s_client,
        dispatcher,
        workflow,
        persona,
        tool_catalog,
    ));

    let state = AppState {
        agent_id: cfg.agent_id.clone(),
        core,
    };
    let router = Router::new().route("/link", get(link::link_handler)).with_state(state);

    let advertised_endpoint = advertise_endpoint(&cfg.link_bind);
    tokio::spawn(registration::run(
        cfg.gateway_url.clone(),
        cfg.agent_id.clone(),
        advertised_endpoint,
        Some(workflow_id),
        cfg.routing,
        Duration::from_millis(cfg.heartbeat_period_ms),
    ));

    info!(agent_id = %cfg.agent_id, bind = %cfg.link_bind, "switchboard-agent listening");
    let listener = tokio::net::TcpListener::bind(&cfg.link_bind).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

/// `link_bind` is the address this process listens on (often `0.0.0.0:…`,
/// unreachable as a dial target); the gateway needs an actual address to
/// connect back to, so a wildcard host is rewritten to loopback. Agents
/// behind a real load balancer should set `link_bind` to a concrete host.
fn advertise_endpoint(link_bind: &str) -> String {
    let host = link_bind.replace("0.0.0.0", "127.0.0.1");
    format!("ws://{host}/link")
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

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
