// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A customer identity established by a successful identity-verification
/// tool call. Never constructed by anything but the IDV flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedUser {
    pub customer_name: String,
    pub account_id: String,
    pub sort_code: String,
    pub verified_at: DateTime<Utc>,
}

/// Per-session record owned by the Session Memory Store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMemory {
    pub verified: bool,
    pub verified_user: Option<VerifiedUser>,
    pub user_intent: Option<String>,
    pub current_agent_id: String,
    pub task_summary: Option<String>,
    pub handoff_in_flight: bool,
}

impl SessionMemory {
    /// A fresh record for a session that has not yet reached any agent.
    pub fn new(current_agent_id: impl Into<String>) -> Self {
        Self {
            verified: false,
            verified_user: None,
            user_intent: None,
            current_agent_id: current_agent_id.into(),
            task_summary: None,
            handoff_in_flight: false,
        }
    }
}

/// A proposed mutation to a `SessionMemory` record, carrying enough context
/// for the store to enforce the intent-lifecycle policy.
///
/// This is the in-process analog of the `update_memory` / `handoff_request`
/// wire frames — the gateway builds one of these from whichever
/// frame it just received and hands it to `MemoryStore::update`.
#[derive(Debug, Clone, Default)]
pub struct MemoryUpdate {
    /// Id of the agent that originated this update (for intent-ownership checks).
    pub source_agent_id: String,
    /// Whether `source_agent_id` is the routing agent.
    pub is_routing_agent: bool,
    /// Attempt to set `userIntent` to this value. Subject to I-M2.
    pub set_user_intent: Option<String>,
    /// True when this update accompanies an `isReturn=true` handoff: clears
    /// `userIntent` and records `task_summary` unconditionally.
    pub is_return: bool,
    /// `taskCompleted` text, required and used only when `is_return`.
    pub task_completed: Option<String>,
    /// A verified-user record to merge in. Never downgrades an
    /// already-verified session (a `None` here never clears verification).
    pub verified_user: Option<VerifiedUser>,
    /// Explicit reset of verification state. No agent in this core emits
    /// this; it exists so the invariant (I-M1) is mechanically enforceable.
    pub clear_verified_user: bool,
    /// New `currentAgentId`, set by the gateway once a handoff resolves.
    pub current_agent_id: Option<String>,
}

impl MemoryUpdate {
    pub fn from_agent(source_agent_id: impl Into<String>, is_routing_agent: bool) -> Self {
        Self {
            source_agent_id: source_agent_id.into(),
            is_routing_agent,
            ..Default::default()
        }
    }
}
