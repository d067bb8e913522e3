// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Agent Core (C5): the voice-agnostic brain of one agent process.
//!
//! Owns the per-session state machine, builds the load-bearing system
//! prompt, drives the Workflow Engine (`switchboard-workflow`) and Tool
//! Dispatcher (`switchboard-tools`) from `S2SClient` events
//! (`switchboard-s2s`), and emits `AgentCoreEvent`s for the I/O Adapter.

mod agent;
mod error;
mod events;
mod persona;
mod prompts;
mod session;
mod types;

pub use agent::AgentCore;
pub use error::RuntimeError;
pub use events::AgentCoreEvent;
pub use persona::{load_persona, Persona};
pub use prompts::system_prompt;
pub use session::{SessionContext, SessionState};
pub use types::{InheritedMemory, VerifiedUserSnapshot};
