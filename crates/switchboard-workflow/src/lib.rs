// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Workflow Engine (C3).
//!
//! A workflow is a static directed graph loaded once from the agent's
//! `WORKFLOW_FILE` at startup (fail-fast on a malformed graph,
//! implementation note). `WorkflowState` is the small, per-session cursor
//! into that graph; the engine itself holds no session state — callers own
//! a `WorkflowState` per session and pass it back in on every call.

mod engine;
mod error;
mod guard;
mod loader;
mod types;

pub use engine::{advance, decide, init, reset, valid_next};
pub use error::WorkflowError;
pub use guard::GuardContext;
pub use loader::load_workflow;
pub use types::{Edge, Node, NodeKind, Transition, Workflow, WorkflowState};
