// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde_json::Value;

/// Events `AgentCore` emits toward the I/O Adapter (C6), one per outbound
/// wire frame type.
#[derive(Debug, Clone)]
pub enum AgentCoreEvent {
    /// `transcript` frame.
    Transcript {
        role: &'static str,
        text: String,
        is_final: bool,
    },
    /// Raw outbound assistant audio, sent as a binary frame.
    AudioOut(Vec<u8>),
    /// `tool_use` frame: the model invoked a (non-handoff) tool.
    ToolUse {
        call_id: String,
        name: String,
        args: Value,
    },
    /// `handoff_request` frame, bubbled up for the Gateway's Handoff
    /// Coordinator to act on.
    HandoffRequest {
        target_agent_id: String,
        reason: Option<String>,
        is_return: bool,
        task_completed: Option<String>,
        /// This agent's view of SessionMemory, forwarded so the Coordinator
        /// can merge verified-user fields into the session record.
        inherited_memory: crate::types::InheritedMemory,
    },
    /// `workflow_update` frame.
    WorkflowUpdate {
        current_node_id: String,
        node_type: switchboard_workflow::NodeKind,
        next_nodes: Vec<String>,
        valid_transition: bool,
    },
    /// `decision_made` frame: a `decision` node resolved to a specific edge.
    DecisionMade {
        node_id: String,
        chosen_edge: String,
        reasoning: Option<String>,
    },
    /// `update_memory` frame: a tool-observed side effect (e.g. identity
    /// verification) that must cross to the gateway process rather than
    /// mutate SessionMemory in-process.
    UpdateMemory {
        verified_user: Option<switchboard_tools::IdvVerification>,
    },
    /// Non-fatal or fatal session error surfaced to the adapter.
    Error { message: String, fatal: bool },
}
