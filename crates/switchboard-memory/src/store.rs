// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::MemoryError;
use crate::types::{MemoryUpdate, SessionMemory};

/// Session Memory Store (C1).
///
/// Each session's record lives behind its own `Mutex`, reached through an
/// outer `RwLock<HashMap<..>>` that only serializes session creation and
/// deletion, never ordinary reads/updates of existing sessions. Two sessions
/// are always free to update concurrently.
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionMemory>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Create a new record for `session_id`, owned initially by
    /// `current_agent_id` (typically the routing agent). Idempotent: a
    /// second call for the same id is a no-op and returns the existing
    /// record unchanged.
    pub async fn create(
        &self,
        session_id: impl Into<String>,
        current_agent_id: impl Into<String>,
    ) -> SessionMemory {
        let session_id = session_id.into();
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .entry(session_id)
            .or_insert_with(|| Arc::new(Mutex::new(SessionMemory::new(current_agent_id))));
        entry.lock().await.clone()
    }

    /// `Get(sessionId) → SessionMemory | NotFound`.
    pub async fn get(&self, session_id: &str) -> Result<SessionMemory, MemoryError> {
        let cell = self.cell(session_id).await?;
        Ok(cell.lock().await.clone())
    }

    /// `Snapshot(sessionId) → SessionMemory`, an immutable copy for handoff
    /// payloads. Identical to `get` — the returned value already owns its
    /// data and cannot observe later mutation.
    pub async fn snapshot(&self, session_id: &str) -> Result<SessionMemory, MemoryError> {
        self.get(session_id).await
    }

    /// `Delete(sessionId)`.
    pub async fn delete(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }

    /// Apply an arbitrary mutator under the session's exclusive lock. The
    /// mutator is the low-level primitive the higher-level `update` (which
    /// enforces the intent-lifecycle policy) is built on.
    pub async fn update_with<F>(
        &self,
        session_id: &str,
        mutate: F,
    ) -> Result<SessionMemory, MemoryError>
    where
        F: FnOnce(&mut SessionMemory),
    {
        let cell = self.cell(session_id).await?;
        let mut guard = cell.lock().await;
        mutate(&mut guard);
        Ok(guard.clone())
    }

    /// `Update(sessionId, mutator)` — applies the intent-lifecycle policy
    /// to `patch` and returns the resulting record.
    pub async fn update(
        &self,
        session_id: &str,
        patch: MemoryUpdate,
    ) -> Result<SessionMemory, MemoryError> {
        self.update_with(session_id, |mem| apply_policy(mem, patch))
            .await
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    async fn cell(&self, session_id: &str) -> Result<Arc<Mutex<SessionMemory>>, MemoryError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| MemoryError::UnknownSession(session_id.to_string()))
    }
}

/// Intent-lifecycle policy enforced in `Update`.
fn apply_policy(mem: &mut SessionMemory, patch: MemoryUpdate) {
    // 1. Reject a non-routing-agent set when an intent is already present.
    if let Some(intent) = patch.set_user_intent {
        let reject = !patch.is_routing_agent && mem.user_intent.is_some();
        if reject {
            debug!(
                agent = %patch.source_agent_id,
                "rejected userIntent overwrite from non-routing agent"
            );
        } else {
            mem.user_intent = Some(intent);
        }
    }

    // 2. isReturn clears intent and records the task summary atomically.
    if patch.is_return {
        mem.user_intent = None;
        mem.task_summary = patch.task_completed;
    }

    // 3. verifiedUser / verified are always set together; merge never downgrades.
    if let Some(vu) = patch.verified_user {
        mem.verified_user = Some(vu);
        mem.verified = true;
    }
    if patch.clear_verified_user {
        mem.verified_user = None;
        mem.verified = false;
    }

    if let Some(agent_id) = patch.current_agent_id {
        mem.current_agent_id = agent_id;
    }
}
