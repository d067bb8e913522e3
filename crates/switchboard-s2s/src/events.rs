// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde_json::Value;

/// Events a live `S2SSession` delivers on its event channel.
#[derive(Debug, Clone)]
pub enum S2SEvent {
    /// Incremental or complete assistant text.
    AssistantText(String),
    /// Raw assistant audio frame (codec is provider-specific, opaque here).
    AssistantAudio(Vec<u8>),
    /// The model wants to invoke a tool.
    ToolCall { call_id: String, name: String, args: Value },
    /// Token/cost accounting for this turn.
    UsageReport { input_tokens: u32, output_tokens: u32 },
    /// The user started speaking over the assistant; any in-flight
    /// assistant audio should be discarded by the I/O adapter.
    Interruption,
    /// A non-fatal session error reported by the model provider.
    Error(String),
}
