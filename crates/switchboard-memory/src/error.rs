// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

/// Failure modes for `MemoryStore` operations. The store is
/// infallible except for unknown session ids.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("unknown session: {0}")]
    UnknownSession(String),
}
