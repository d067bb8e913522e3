// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

/// A verified-user record as it crosses the wire in a `session_init` memory
/// snapshot. Deliberately a separate type from
/// `switchboard-memory::VerifiedUser` — the agent process never links
/// against the memory store crate; the two communicate only over the
/// gateway↔agent wire protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedUserSnapshot {
    pub customer_name: String,
    pub account_id: String,
    pub sort_code: String,
}

/// The `SessionMemory` snapshot an agent receives in a `session_init` frame,
/// or `None` on first contact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InheritedMemory {
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub verified_user: Option<VerifiedUserSnapshot>,
    #[serde(default)]
    pub user_intent: Option<String>,
    #[serde(default)]
    pub task_summary: Option<String>,
}

impl InheritedMemory {
    pub fn into_guard_context(
        self,
        current_agent_id: impl Into<String>,
    ) -> switchboard_workflow::GuardContext {
        switchboard_workflow::GuardContext {
            verified: self.verified,
            user_intent: self.user_intent,
            current_agent_id: Some(current_agent_id.into()),
            tool_result: None,
        }
    }
}
