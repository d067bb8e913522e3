// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use crate::tool::ToolKind;

const TRANSFER_PREFIX: &str = "transfer_to_";
const RETURN_PREFIX: &str = "return_to_";

/// Classifies a tool call by name, in priority order: handoff,
/// then identity-verification, then data. `idv_tool_names` is the
/// agent-declared set of identity-verification tool names (the
/// `idv_tool_names` config field).
pub fn classify(name: &str, routing_agent_id: &str, idv_tool_names: &[String]) -> ToolKind {
    if let Some(target) = name.strip_prefix(TRANSFER_PREFIX) {
        return ToolKind::Handoff {
            target_agent_id: target.to_string(),
            is_return: false,
        };
    }
    if let Some(target) = name.strip_prefix(RETURN_PREFIX) {
        if target == routing_agent_id {
            return ToolKind::Handoff {
                target_agent_id: target.to_string(),
                is_return: true,
            };
        }
    }
    if idv_tool_names.iter().any(|n| n == name) {
        return ToolKind::Idv;
    }
    ToolKind::Data
}
