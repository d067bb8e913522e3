// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Tool Dispatcher (C4).
//!
//! Classifies outbound tool calls emitted by the model into handoff,
//! identity-verification, or data tools, and routes the latter two to an
//! external executor reached through the [`ToolsClient`] trait. Handoff
//! tools are never executed here — they short-circuit into a
//! [`HandoffRequest`] for the caller to act on.

mod classify;
mod dispatcher;
mod tool;

pub use classify::classify;
pub use dispatcher::{Dispatcher, DispatchOutcome, HandoffRequest, IdvVerification, ToolsClient};
pub use tool::{ToolCall, ToolKind, ToolResult};
