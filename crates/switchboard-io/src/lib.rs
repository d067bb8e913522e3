// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! I/O Adapter (C6): the wire vocabulary shared by both links in the
//! system, plus the per-session translation loop between `Frame`s and
//! `switchboard-runtime::AgentCore` calls/events.

mod adapter;
mod error;
mod frame;

pub use adapter::{IoAdapter, OutboundMessage};
pub use error::IoError;
pub use frame::{Frame, MemoryPatch, VerifiedUserPatch};
