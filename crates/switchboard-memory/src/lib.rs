// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Session Memory Store (C1).
//!
//! Owns the per-session record: verified-user fields,
//! the pending user intent, the last task summary, and the in-flight handoff
//! flag. The store is the sole authority over this state — agents only ever
//! see it through a `session_init` snapshot or a `Snapshot` handed to a
//! handoff payload; they can only mutate it by sending an `update_memory`
//! frame back through the gateway (see `switchboard-gateway`).
//!
//! Every session's record sits behind its own lock (sharded by session id),
//! so updates to session A never block a concurrent update to session B.

mod error;
mod store;
mod types;

pub use error::MemoryError;
pub use store::MemoryStore;
pub use types::{MemoryUpdate, SessionMemory, VerifiedUser};
