// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::events::S2SEvent;

/// A tool as advertised to the model on `Open` — name, description, and
/// JSON Schema parameters, independent of how `switchboard-tools` classifies
/// or dispatches it.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone)]
pub struct OpenParams {
    pub system_prompt: String,
    pub tool_catalog: Vec<ToolSchema>,
    pub voice_preset: Option<String>,
}

/// The `S2SClient` capability: opens a persistent duplex model
/// session. Unlike a request-response completion API, a single `open` call
/// stays live for the whole conversation turn-taking loop.
#[async_trait]
pub trait S2SClient: Send + Sync {
    async fn open(&self, params: OpenParams) -> anyhow::Result<(Box<dyn S2SSession>, mpsc::UnboundedReceiver<S2SEvent>)>;
}

/// A single open duplex session against the model, returned by `open`.
///
/// `SendToolResult` answers a `ToolCall` event and is not enumerated in the
/// capability list alongside `Open`/`SendUserText`/`SendUserAudio`/
/// `Close`, but without it the tool-calling loop can never close — the
/// model has no way to learn a tool's outcome. Treated here as implied by
/// the event contract rather than a deviation from it.
#[async_trait]
pub trait S2SSession: Send + Sync {
    async fn send_user_text(&self, text: &str) -> anyhow::Result<()>;
    async fn send_user_audio(&self, frame: &[u8]) -> anyhow::Result<()>;
    async fn send_tool_result(&self, call_id: &str, result: Value, is_error: bool) -> anyhow::Result<()>;
    async fn close(&self) -> anyhow::Result<()>;
}
