// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! `ToolsClient` backed by an external HTTP tool executor:
//! identity-verification calls go to `{base}/idv`, everything else to
//! `{base}/data`. A call that can't even reach the executor becomes a
//! `ToolResult::err`, never a propagated error — the dispatcher always
//! gets an answer to hand back to the model.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use switchboard_tools::{ToolCall, ToolResult, ToolsClient};

pub struct HttpToolsClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpToolsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url: base_url.into() })
    }

    async fn execute(&self, route: &str, call: &ToolCall) -> ToolResult {
        let url = format!("{}/{route}", self.base_url);
        let body = ExecuteRequest {
            call_id: &call.call_id,
            name: &call.name,
            args: &call.args,
        };

        let response = match self.http.post(&url).json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(tool = %call.name, %url, error = %e, "tool executor unreachable");
                return ToolResult::err(call.call_id.clone(), "network", e.to_string());
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            return ToolResult::err(call.call_id.clone(), "http_status", format!("executor returned {status}"));
        }

        match response.json::<ExecuteResponse>().await {
            Ok(body) if body.success => ToolResult::ok(call.call_id.clone(), body.payload.unwrap_or(serde_json::Value::Null)),
            Ok(body) => ToolResult::err(
                call.call_id.clone(),
                body.error_kind.unwrap_or_else(|| "tool_failure".into()),
                body.error_message.unwrap_or_else(|| "tool execution failed".into()),
            ),
            Err(e) => ToolResult::err(call.call_id.clone(), "decode", e.to_string()),
        }
    }
}

#[async_trait]
impl ToolsClient for HttpToolsClient {
    async fn call_idv(&self, call: &ToolCall) -> ToolResult {
        self.execute("idv", call).await
    }

    async fn call_data(&self, call: &ToolCall) -> ToolResult {
        self.execute("data", call).await
    }
}

#[derive(Serialize)]
struct ExecuteRequest<'a> {
    call_id: &'a str,
    name: &'a str,
    args: &'a serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteResponse {
    success: bool,
    #[serde(default)]
    payload: Option<serde_json::Value>,
    #[serde(default)]
    error_kind: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}
