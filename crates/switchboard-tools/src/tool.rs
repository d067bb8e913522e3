// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde_json::Value;

/// A single tool invocation requested by the model via `ToolCall` events on
/// the `S2SClient` event stream.
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// Opaque id the model expects to see echoed back in `SendToolResult`.
    pub call_id: String,
    pub name: String,
    pub args: Value,
}

/// The outcome of dispatching a `ToolCall`, handed back to the agent core
/// for `SendToolResult`.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub call_id: String,
    pub success: bool,
    pub payload: Option<Value>,
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
}

impl ToolResult {
    pub fn ok(call_id: impl Into<String>, payload: Value) -> Self {
        Self {
            call_id: call_id.into(),
            success: true,
            payload: Some(payload),
            error_kind: None,
            error_message: None,
        }
    }

    pub fn err(call_id: impl Into<String>, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            success: false,
            payload: None,
            error_kind: Some(kind.into()),
            error_message: Some(message.into()),
        }
    }

    /// The synthetic result returned in place of executing a handoff tool
    ///: the dispatcher never invokes a handoff tool, it reports
    /// the handoff as pending and lets the gateway's Handoff Coordinator
    /// carry out the transition out-of-band.
    pub fn handoff_pending(call_id: impl Into<String>) -> Self {
        Self::ok(call_id, serde_json::json!({ "status": "handoff_pending" }))
    }
}

/// Classification of a tool call by name, in dispatch priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolKind {
    /// `transfer_to_<agentId>` or `return_to_<routingAgentId>`.
    Handoff { target_agent_id: String, is_return: bool },
    /// A named identity-verification tool (e.g. `perform_idv_check`).
    Idv,
    /// Everything else, routed to the generic external tool executor.
    Data,
}
