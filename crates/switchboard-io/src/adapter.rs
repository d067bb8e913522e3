// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! I/O Adapter (C6): the only part of the agent process that knows about
//! the wire. Translates inbound `Frame`s from the gateway↔agent link into
//! `AgentCore` calls, and `AgentCoreEvent`s back into `Frame`s.
//!
//! Carries no business logic of its own: every decision (workflow
//! transition, handoff, memory update) is made by `AgentCore` or upstream
//! by the Gateway. This module only multiplexes and translates.

use std::sync::Arc;

use switchboard_runtime::{AgentCore, AgentCoreEvent, InheritedMemory};
use tokio::sync::mpsc;
use tracing::{error, warn};

use crate::error::IoError;
use crate::frame::{Frame, MemoryPatch, VerifiedUserPatch};

/// Everything `IoAdapter` can hand back to the transport loop for a given
/// session: either a JSON `Frame`, or raw PCM bytes bound for the link's
/// binary channel.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    Frame(Frame),
    Audio { session_id: String, bytes: Vec<u8> },
}

/// Binary audio frames never go through `Frame`; a transport loop reading
/// from the gateway link hands them here directly, alongside the session
/// they belong to.
pub struct IoAdapter {
    agent_id: String,
    core: Arc<AgentCore>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl IoAdapter {
    /// `out_tx` is the single multiplexed sink for every outbound message
    /// on this agent's gateway link; one physical WebSocket carries every
    /// session this agent process hosts.
    pub fn new(agent_id: impl Into<String>, core: Arc<AgentCore>, out_tx: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        Self {
            agent_id: agent_id.into(),
            core,
            out_tx,
        }
    }

    /// Dispatch one inbound `Frame` from the gateway link.
    pub async fn handle_frame(&self, frame: Frame) -> Result<(), IoError> {
        match frame {
            Frame::SessionInit {
                session_id,
                inherited_memory,
                trace_id: _,
            } => self.start_session(session_id, inherited_memory).await,
            Frame::UserInput { session_id, text } => {
                let session_id = session_id.ok_or_else(|| IoError::MissingSessionId("user_input".into()))?;
                self.handle_user_input(&session_id, &text).await
            }
            Frame::EndAudio { session_id } => {
                // The S2S provider finalizes its own turn-taking from the
                // audio stream itself; this frame exists for clients whose
                // transport can't signal end-of-utterance any other way.
                let _ = session_id;
                Ok(())
            }
            Frame::SessionEnd { session_id } => {
                self.core.end_session(&session_id).await.map_err(IoError::from)
            }
            other => Err(IoError::Unexpected(frame_type_name(&other))),
        }
    }

    /// `user_input` and `end_audio` frames are scoped to a session by the
    /// gateway link's framing (one frame always names its `sessionId`
    /// alongside the envelope the transport loop reads); callers that have
    /// already extracted the session id use these directly.
    pub async fn handle_user_input(&self, session_id: &str, text: &str) -> Result<(), IoError> {
        self.core.handle_user_input(session_id, text).await.map_err(IoError::from)
    }

    pub async fn handle_user_audio(&self, session_id: &str, pcm: &[u8]) -> Result<(), IoError> {
        self.core.handle_user_audio(session_id, pcm).await.map_err(IoError::from)
    }

    async fn start_session(&self, session_id: String, inherited: InheritedMemory) -> Result<(), IoError> {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        self.core
            .init_session(session_id.clone(), inherited, event_tx)
            .await?;

        let _ = self.out_tx.send(OutboundMessage::Frame(Frame::SessionAck {
            session_id: session_id.clone(),
            agent_id: self.agent_id.clone(),
        }));

        let out_tx = self.out_tx.clone();
        let ack_session_id = session_id.clone();
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                let message = to_outbound(&ack_session_id, event);
                if out_tx.send(message).is_err() {
                    warn!(session_id = %ack_session_id, "gateway link closed, dropping outbound message");
                    break;
                }
            }
        });

        Ok(())
    }
}

/// `AudioOut` events skip `Frame` entirely and come back as a raw
/// `OutboundMessage::Audio`, so the transport loop writes them to the
/// link's binary channel instead of serializing JSON.
fn to_outbound(session_id: &str, event: AgentCoreEvent) -> OutboundMessage {
    match event {
        AgentCoreEvent::Transcript { role, text, is_final } => OutboundMessage::Frame(Frame::Transcript {
            session_id: session_id.to_string(),
            role: role.to_string(),
            text,
            is_final,
        }),
        AgentCoreEvent::AudioOut(bytes) => OutboundMessage::Audio {
            session_id: session_id.to_string(),
            bytes,
        },
        AgentCoreEvent::ToolUse { call_id, name, args } => OutboundMessage::Frame(Frame::ToolUse {
            session_id: session_id.to_string(),
            tool_name: name,
            tool_call_id: call_id,
            arguments: args,
        }),
        AgentCoreEvent::HandoffRequest {
            target_agent_id,
            reason,
            is_return,
            task_completed,
            inherited_memory,
        } => OutboundMessage::Frame(Frame::HandoffRequest {
            session_id: session_id.to_string(),
            target_agent_id,
            reason,
            is_return,
            task_completed,
            inherited_memory,
        }),
        AgentCoreEvent::WorkflowUpdate {
            current_node_id,
            node_type,
            next_nodes,
            valid_transition,
        } => OutboundMessage::Frame(Frame::WorkflowUpdate {
            session_id: session_id.to_string(),
            current_node_id,
            node_type,
            next_nodes,
            valid_transition,
        }),
        AgentCoreEvent::DecisionMade {
            node_id,
            chosen_edge,
            reasoning,
        } => OutboundMessage::Frame(Frame::DecisionMade {
            session_id: session_id.to_string(),
            node_id,
            chosen_edge,
            reasoning,
        }),
        AgentCoreEvent::UpdateMemory { verified_user } => OutboundMessage::Frame(Frame::UpdateMemory {
            session_id: session_id.to_string(),
            patch: MemoryPatch {
                verified_user: verified_user.map(|v| VerifiedUserPatch {
                    customer_name: v.customer_name,
                    account_id: v.account_id,
                    sort_code: v.sort_code,
                }),
                user_intent: None,
                task_summary: None,
            },
        }),
        AgentCoreEvent::Error { message, fatal } => {
            if fatal {
                error!(session_id, %message, "fatal agent error");
            }
            OutboundMessage::Frame(Frame::Error {
                session_id: session_id.to_string(),
                message,
                fatal,
            })
        }
    }
}

fn frame_type_name(frame: &Frame) -> String {
    match frame {
        Frame::SelectWorkflow { .. } => "select_workflow",
        Frame::UserInput { .. } => "user_input",
        Frame::EndAudio { .. } => "end_audio",
        Frame::Ping { .. } => "ping",
        Frame::Connected { .. } => "connected",
        Frame::Transcript { .. } => "transcript",
        Frame::WorkflowUpdate { .. } => "workflow_update",
        Frame::ToolUse { .. } => "tool_use",
        Frame::DecisionMade { .. } => "decision_made",
        Frame::Handoff { .. } => "handoff",
        Frame::Error { .. } => "error",
        Frame::Usage { .. } => "usage",
        Frame::SessionInit { .. } => "session_init",
        Frame::SessionAck { .. } => "session_ack",
        Frame::SessionEnd { .. } => "session_end",
        Frame::HandoffRequest { .. } => "handoff_request",
        Frame::UpdateMemory { .. } => "update_memory",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_tools::IdvVerification;
    use switchboard_workflow::NodeKind;

    #[test]
    fn transcript_event_maps_to_transcript_frame() {
        let message = to_outbound(
            "s1",
            AgentCoreEvent::Transcript {
                role: "assistant",
                text: "hi".into(),
                is_final: true,
            },
        );
        assert!(matches!(message, OutboundMessage::Frame(Frame::Transcript { session_id, .. }) if session_id == "s1"));
    }

    #[test]
    fn audio_out_event_becomes_raw_outbound_audio() {
        let message = to_outbound("s1", AgentCoreEvent::AudioOut(vec![0, 1, 2]));
        match message {
            OutboundMessage::Audio { session_id, bytes } => {
                assert_eq!(session_id, "s1");
                assert_eq!(bytes, vec![0, 1, 2]);
            }
            _ => panic!("expected Audio"),
        }
    }

    #[test]
    fn update_memory_event_carries_verified_user_into_patch() {
        let message = to_outbound(
            "s1",
            AgentCoreEvent::UpdateMemory {
                verified_user: Some(IdvVerification {
                    customer_name: "Jo".into(),
                    account_id: "A1".into(),
                    sort_code: "00-00-00".into(),
                }),
            },
        );
        match message {
            OutboundMessage::Frame(Frame::UpdateMemory { patch, .. }) => {
                assert_eq!(patch.verified_user.unwrap().account_id, "A1");
            }
            _ => panic!("expected UpdateMemory"),
        }
    }

    #[test]
    fn workflow_update_event_maps_node_kind_through() {
        let message = to_outbound(
            "s1",
            AgentCoreEvent::WorkflowUpdate {
                current_node_id: "fetch".into(),
                node_type: NodeKind::ToolCall,
                next_nodes: vec!["end".into()],
                valid_transition: true,
            },
        );
        assert!(matches!(
            message,
            OutboundMessage::Frame(Frame::WorkflowUpdate { node_type: NodeKind::ToolCall, .. })
        ));
    }
}
