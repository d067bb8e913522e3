// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! `S2SClient` — the speech-to-speech model session capability.
//!
//! Unlike a request/response completion API, opening a session here gets
//! you a live duplex channel: `send_user_text`/`send_user_audio` push input
//! in, and an `S2SEvent` stream pushes assistant output, tool calls, and
//! usage/interruption signals back out, for the lifetime of the
//! conversation.

mod client;
mod events;
mod mock;

pub use client::{OpenParams, S2SClient, S2SSession, ToolSchema};
pub use events::S2SEvent;
pub use mock::ScriptedMockClient;
