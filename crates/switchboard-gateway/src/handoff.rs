// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Handoff Coordinator (C8) — the parts of the H0→H7 state machine that are pure decisions over `MemoryStore`/`AgentRegistry` state,
//! factored out so they can be unit tested without a live socket.
//!
//! The steps that require an actual connection — H3 (close old upstream),
//! H4 (dial new upstream, await `session_ack`), H5 (flush the buffer) — are
//! driven by `session::SessionActor::perform_handoff`, which calls into
//! `apply_memory` and `resolve_target` at the right points and aborts the
//! same way on failure: restore `currentAgentId`, drain the buffer back to
//! the old upstream if still open, otherwise discard it and report a fatal
//! error.

use switchboard_io::Frame;
use switchboard_memory::{MemoryStore, MemoryUpdate, SessionMemory, VerifiedUser};
use switchboard_registry::{Agent, AgentRegistry};

use crate::error::GatewayError;

/// Everything the handoff coordinator needs to know about one
/// `handoff_request` frame, independent of how it arrived.
pub struct HandoffRequestArgs {
    pub session_id: String,
    pub from_agent_id: String,
    pub from_is_routing: bool,
    pub target_agent_id: String,
    pub reason: Option<String>,
    pub is_return: bool,
    pub task_completed: Option<String>,
    pub verified_user: Option<VerifiedUser>,
}

impl HandoffRequestArgs {
    pub fn from_frame(session_id: String, from_agent_id: String, from_is_routing: bool, frame: &Frame) -> Option<Self> {
        match frame {
            Frame::HandoffRequest {
                target_agent_id,
                reason,
                is_return,
                task_completed,
                inherited_memory,
                ..
            } => Some(Self {
                session_id,
                from_agent_id,
                from_is_routing,
                target_agent_id: target_agent_id.clone(),
                reason: reason.clone(),
                is_return: *is_return,
                task_completed: task_completed.clone(),
                verified_user: inherited_memory.verified_user.clone().map(|v| VerifiedUser {
                    customer_name: v.customer_name,
                    account_id: v.account_id,
                    sort_code: v.sort_code,
                    verified_at: chrono::Utc::now(),
                }),
            }),
            _ => None,
        }
    }
}

/// H1: apply the memory-lifecycle policy for this handoff and return the resulting record, which is what the new agent's
/// `session_init` frame carries as `inheritedMemory`.
pub async fn apply_memory(store: &MemoryStore, req: &HandoffRequestArgs) -> Result<SessionMemory, GatewayError> {
    store.update(&req.session_id, MemoryUpdate {
        source_agent_id: req.from_agent_id.clone(),
        is_routing_agent: req.from_is_routing,
        set_user_intent: req.reason.clone(),
        is_return: req.is_return,
        task_completed: req.task_completed.clone(),
        verified_user: req.verified_user.clone(),
        clear_verified_user: false,
        current_agent_id: None,
    })
    .await
    .map_err(GatewayError::from)
}

/// H2: resolve the handoff target to a live, healthy agent. `NotFound` and
/// `Unhealthy` both abort the handoff.
pub fn resolve_target(registry: &AgentRegistry, target_agent_id: &str) -> Result<Agent, GatewayError> {
    registry.resolve(target_agent_id, false).map_err(GatewayError::from)
}

/// H6: commit the new `currentAgentId` once the new upstream has ack'd and
/// the buffer has flushed.
pub async fn commit_current_agent(
    store: &MemoryStore,
    session_id: &str,
    agent_id: &str,
) -> Result<(), GatewayError> {
    store
        .update_with(session_id, |mem| mem.current_agent_id = agent_id.to_string())
        .await
        .map(|_| ())
        .map_err(GatewayError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn req(session_id: &str, is_return: bool) -> HandoffRequestArgs {
        HandoffRequestArgs {
            session_id: session_id.into(),
            from_agent_id: "routing".into(),
            from_is_routing: true,
            target_agent_id: "banking".into(),
            reason: None,
            is_return,
            task_completed: None,
            verified_user: None,
        }
    }

    #[tokio::test]
    async fn apply_memory_sets_intent_free_record_on_return() {
        let store = MemoryStore::new();
        store.create("s1", "banking").await;
        let mut r = req("s1", true);
        r.task_completed = Some("balance checked".into());
        let mem = apply_memory(&store, &r).await.unwrap();
        assert!(mem.user_intent.is_none());
        assert_eq!(mem.task_summary.as_deref(), Some("balance checked"));
    }

    #[tokio::test]
    async fn apply_memory_sets_user_intent_from_reason_on_routing_agent_handoff() {
        let store = MemoryStore::new();
        store.create("s1", "routing").await;
        let mut r = req("s1", false);
        r.reason = Some("balance inquiry".into());
        let mem = apply_memory(&store, &r).await.unwrap();
        assert_eq!(mem.user_intent.as_deref(), Some("balance inquiry"));
    }

    #[tokio::test]
    async fn apply_memory_does_not_let_a_non_routing_agent_overwrite_existing_intent() {
        let store = MemoryStore::new();
        store.create("s1", "banking").await;
        let mut first = req("s1", false);
        first.reason = Some("balance inquiry".into());
        apply_memory(&store, &first).await.unwrap();

        let mut second = req("s1", false);
        second.from_agent_id = "banking".into();
        second.from_is_routing = false;
        second.reason = Some("something else".into());
        let mem = apply_memory(&store, &second).await.unwrap();
        assert_eq!(mem.user_intent.as_deref(), Some("balance inquiry"));
    }

    #[test]
    fn resolve_target_reports_unknown_agent() {
        let registry = AgentRegistry::new(Duration::from_secs(60));
        let err = resolve_target(&registry, "ghost").unwrap_err();
        assert!(matches!(err, GatewayError::UnknownAgent(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn commit_current_agent_updates_the_record() {
        let store = MemoryStore::new();
        store.create("s1", "routing").await;
        commit_current_agent(&store, "s1", "banking").await.unwrap();
        assert_eq!(store.get("s1").await.unwrap().current_agent_id, "banking");
    }

    #[test]
    fn from_frame_maps_handoff_request_frame_fields() {
        let frame = Frame::HandoffRequest {
            session_id: "s1".into(),
            target_agent_id: "banking".into(),
            reason: Some("balance inquiry".into()),
            is_return: false,
            task_completed: None,
            inherited_memory: switchboard_runtime::InheritedMemory::default(),
        };
        let args = HandoffRequestArgs::from_frame("s1".into(), "routing".into(), true, &frame).unwrap();
        assert_eq!(args.target_agent_id, "banking");
        assert_eq!(args.reason.as_deref(), Some("balance inquiry"));
        assert!(!args.is_return);
    }
}
