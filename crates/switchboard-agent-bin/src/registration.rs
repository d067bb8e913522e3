// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Joins the gateway's Agent Registry (C2) at startup and stays live with
//! periodic heartbeats. Registration retries with a fixed
//! backoff until the gateway answers — an agent process that starts before
//! its gateway must not give up.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize)]
struct RegisterRequest<'a> {
    agent_id: &'a str,
    endpoint: &'a str,
    capabilities: &'a [String],
    workflow_id: Option<&'a str>,
    routing: bool,
}

/// Runs forever: registers once, then heartbeats every `period` until the
/// process exits. Intended to be spawned as its own task.
pub async fn run(
    gateway_url: String,
    agent_id: String,
    endpoint: String,
    workflow_id: Option<String>,
    routing: bool,
    period: Duration,
) {
    let client = reqwest::Client::new();
    register_with_retry(&client, &gateway_url, &agent_id, &endpoint, &workflow_id, routing).await;

    let mut ticker = tokio::time::interval(period);
    ticker.tick().await; // first tick fires immediately; registration above already covered it
    loop {
        ticker.tick().await;
        let url = format!("{gateway_url}/agents/{agent_id}/heartbeat");
        match client.post(&url).send().await {
            Ok(resp) if resp.status().is_success() => debug!(%agent_id, "heartbeat ok"),
            Ok(resp) => warn!(%agent_id, status = %resp.status(), "heartbeat rejected"),
            Err(e) => warn!(%agent_id, error = %e, "heartbeat failed"),
        }
    }
}

async fn register_with_retry(
    client: &reqwest::Client,
    gateway_url: &str,
    agent_id: &str,
    endpoint: &str,
    workflow_id: &Option<String>,
    routing: bool,
) {
    let url = format!("{gateway_url}/agents/register");
    let body = RegisterRequest {
        agent_id,
        endpoint,
        capabilities: &[],
        workflow_id: workflow_id.as_deref(),
        routing,
    };

    loop {
        match client.post(&url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!(%agent_id, %endpoint, "registered with gateway");
                return;
            }
            Ok(resp) => warn!(%agent_id, status = %resp.status(), "gateway rejected registration, retrying"),
            Err(e) => warn!(%agent_id, error = %e, "gateway unreachable, retrying"),
        }
        tokio::time::sleep(Duration::from_secs(3)).await;
    }
}
