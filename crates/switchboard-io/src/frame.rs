// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! The wire vocabulary shared by both links in the system:
//! client↔gateway and gateway↔agent. Binary WebSocket frames always carry
//! raw 16-bit little-endian PCM and never appear in this enum; every other
//! exchange is one of these JSON frames, internally tagged by `type`.
//!
//! Field names follow wire-protocol casing (`sessionId`, `toolCallId`, ...)
//! rather than Rust's usual snake_case, since this type is serialized
//! directly onto the wire for non-Rust clients (the voice UI, the agent's
//! gateway link) to consume.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use switchboard_runtime::InheritedMemory;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Frame {
    // ── client → gateway ────────────────────────────────────────────────
    #[serde(rename = "select_workflow")]
    #[serde(rename_all = "camelCase")]
    SelectWorkflow { workflow_id: String },
    /// `sessionId` is absent on the client link (one socket is one session)
    /// and present when the Gateway re-frames this onto the multiplexed
    /// agent link.
    #[serde(rename = "user_input")]
    #[serde(rename_all = "camelCase")]
    UserInput {
        #[serde(default)]
        session_id: Option<String>,
        text: String,
    },
    #[serde(rename = "end_audio")]
    #[serde(rename_all = "camelCase")]
    EndAudio {
        #[serde(default)]
        session_id: Option<String>,
    },
    #[serde(rename = "ping")]
    Ping { ts: i64 },

    // ── gateway → client ────────────────────────────────────────────────
    #[serde(rename = "connected")]
    #[serde(rename_all = "camelCase")]
    Connected { session_id: String },
    #[serde(rename = "transcript")]
    #[serde(rename_all = "camelCase")]
    Transcript {
        session_id: String,
        role: String,
        text: String,
        #[serde(rename = "final")]
        is_final: bool,
    },
    #[serde(rename = "workflow_update")]
    #[serde(rename_all = "camelCase")]
    WorkflowUpdate {
        session_id: String,
        current_node_id: String,
        node_type: switchboard_workflow::NodeKind,
        next_nodes: Vec<String>,
        valid_transition: bool,
    },
    #[serde(rename = "tool_use")]
    #[serde(rename_all = "camelCase")]
    ToolUse {
        session_id: String,
        tool_name: String,
        tool_call_id: String,
        arguments: Value,
    },
    #[serde(rename = "decision_made")]
    #[serde(rename_all = "camelCase")]
    DecisionMade {
        session_id: String,
        node_id: String,
        chosen_edge: String,
        reasoning: Option<String>,
    },
    #[serde(rename = "handoff")]
    #[serde(rename_all = "camelCase")]
    Handoff {
        session_id: String,
        from_agent_id: String,
        to_agent_id: String,
        reason: Option<String>,
        is_return: bool,
    },
    #[serde(rename = "error")]
    #[serde(rename_all = "camelCase")]
    Error {
        session_id: String,
        message: String,
        fatal: bool,
    },
    #[serde(rename = "usage")]
    #[serde(rename_all = "camelCase")]
    Usage {
        session_id: String,
        input_tokens: u32,
        output_tokens: u32,
        audio_ms: u32,
    },

    // ── gateway ↔ agent ─────────────────────────────────────────────────
    #[serde(rename = "session_init")]
    #[serde(rename_all = "camelCase")]
    SessionInit {
        session_id: String,
        inherited_memory: InheritedMemory,
        trace_id: String,
    },
    #[serde(rename = "session_ack")]
    #[serde(rename_all = "camelCase")]
    SessionAck { session_id: String, agent_id: String },
    #[serde(rename = "session_end")]
    #[serde(rename_all = "camelCase")]
    SessionEnd { session_id: String },
    #[serde(rename = "handoff_request")]
    #[serde(rename_all = "camelCase")]
    HandoffRequest {
        session_id: String,
        target_agent_id: String,
        reason: Option<String>,
        is_return: bool,
        task_completed: Option<String>,
        inherited_memory: InheritedMemory,
    },
    #[serde(rename = "update_memory")]
    #[serde(rename_all = "camelCase")]
    UpdateMemory {
        session_id: String,
        patch: MemoryPatch,
    },
}

/// The partial `SessionMemory` patch carried by an `update_memory` frame
///. Only the fields an agent is allowed to influence directly —
/// `currentAgentId` is set by the Gateway itself on handoff, never by an
/// agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryPatch {
    pub verified_user: Option<VerifiedUserPatch>,
    pub user_intent: Option<String>,
    pub task_summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedUserPatch {
    pub customer_name: String,
    pub account_id: String,
    pub sort_code: String,
}
