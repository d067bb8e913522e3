// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use switchboard_s2s::S2SSession;
use switchboard_workflow::WorkflowState;

use crate::types::InheritedMemory;

/// Per-session state machine: `S0 Uninitialized` is the absence
/// of a `SessionContext` entry; everything from `S1` on is represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Initialized,
    Active,
    Closing,
    Closed,
}

/// Everything Agent Core holds for one live session.
pub struct SessionContext {
    pub session_id: String,
    pub s2s_session: Box<dyn S2SSession>,
    pub workflow_state: WorkflowState,
    /// Local cache of the fields a guard expression needs: kept
    /// in sync with the inherited snapshot at `InitSession` and with the
    /// most recent tool result's side effects, but never authoritative —
    /// SessionMemory itself is owned by the Gateway (C1).
    pub memory: InheritedMemory,
    pub state: SessionState,
    /// Set before the auto-trigger synthetic `HandleUserInput` call is
    /// issued, so a reconnect within the same `SessionContext` can never
    /// re-fire it.
    pub already_triggered: bool,
}

impl SessionContext {
    pub fn new(
        session_id: String,
        s2s_session: Box<dyn S2SSession>,
        workflow_state: WorkflowState,
        memory: InheritedMemory,
    ) -> Self {
        Self {
            session_id,
            s2s_session,
            workflow_state,
            memory,
            state: SessionState::Initialized,
            already_triggered: false,
        }
    }
}
