// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Session Gateway (C7): one `SessionActor` per client WebSocket
//! connection, proxying frames to whichever agent process currently owns
//! the session and driving the Handoff Coordinator when
//! the upstream agent asks to hand off.
//!
//! Lifecycle: Accept → Select → Dial → Proxy ⇄ Intercept(handoff) → Close.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message as UpstreamMessage;
use tracing::{debug, info, warn};
use uuid::Uuid;

use switchboard_io::Frame;
use switchboard_memory::SessionMemory;

use crate::circuit::SessionCircuit;
use crate::error::GatewayError;
use crate::handoff::{self, HandoffRequestArgs};
use crate::state::AppState;

type Upstream = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

pub struct SessionActor {
    session_id: String,
    state: AppState,
    client: WebSocket,
    current_agent_id: String,
    upstream: Upstream,
    buffer: Vec<Frame>,
    handoff_in_flight: bool,
    circuit: SessionCircuit,
}

impl SessionActor {
    /// Accept + Select + Dial: establish the session record, resolve an
    /// initial agent (the client's requested workflow, or the routing
    /// agent if the client doesn't choose within
    /// `select_workflow_timeout_ms`), and open the upstream link.
    pub async fn accept(state: AppState, mut client: WebSocket) -> Result<Self, GatewayError> {
        let session_id = Uuid::new_v4().to_string();
        send_client(
            &mut client,
            &Frame::Connected {
                session_id: session_id.clone(),
            },
        )
        .await?;

        let requested_workflow = wait_for_workflow_selection(
            &mut client,
            Duration::from_millis(state.config.gateway.select_workflow_timeout_ms),
        )
        .await;

        let target_agent_id = match requested_workflow {
            Some(workflow_id) => resolve_agent_for_workflow(&state, &workflow_id)?,
            None => state.registry.routing().map_err(GatewayError::from)?.agent_id,
        };
        let agent = state.registry.resolve(&target_agent_id, false).map_err(GatewayError::from)?;

        state.memory.create(session_id.clone(), agent.agent_id.clone()).await;

        let upstream = dial_upstream(
            &agent.endpoint,
            Duration::from_millis(state.config.gateway.upstream_dial_timeout_ms),
        )
        .await?;

        let mut actor = Self {
            session_id: session_id.clone(),
            circuit: SessionCircuit::new(state.config.gateway.max_session_errors, state.config.gateway.error_window_ms),
            state,
            client,
            current_agent_id: agent.agent_id.clone(),
            upstream,
            buffer: Vec::new(),
            handoff_in_flight: false,
        };

        actor
            .send_upstream(&Frame::SessionInit {
                session_id: session_id.clone(),
                inherited_memory: Default::default(),
                trace_id: Uuid::new_v4().to_string(),
            })
            .await?;
        await_session_ack(&mut actor.upstream).await?;

        Ok(actor)
    }

    /// Proxy ⇄ Intercept ⇄ Close: the session's main loop. Runs until
    /// either side closes or a fatal error trips the circuit breaker.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                msg = self.client.recv() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if let Err(e) = self.on_client_text(text).await {
                                if self.note_error(&e).await { break; }
                            }
                        }
                        Some(Ok(Message::Binary(pcm))) => {
                            let frame = UpstreamMessage::Binary(pcm);
                            if self.upstream.send(frame).await.is_err() { break; }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            debug!(session_id = %self.session_id, "client recv error: {e}");
                            break;
                        }
                    }
                }
                msg = self.upstream.next() => {
                    match msg {
                        Some(Ok(UpstreamMessage::Text(text))) => {
                            if let Err(e) = self.on_upstream_text(text).await {
                                if self.note_error(&e).await { break; }
                            }
                        }
                        Some(Ok(UpstreamMessage::Binary(pcm))) => {
                            if self.client.send(Message::Binary(pcm)).await.is_err() { break; }
                        }
                        Some(Ok(UpstreamMessage::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            debug!(session_id = %self.session_id, "upstream recv error: {e}");
                            break;
                        }
                    }
                }
            }
        }

        self.close().await;
    }

    async fn on_client_text(&mut self, text: String) -> Result<(), GatewayError> {
        let frame: Frame = serde_json::from_str(&text)
            .map_err(|e| GatewayError::ProtocolViolation(format!("invalid client frame: {e}")))?;

        if self.handoff_in_flight {
            if self.buffer.len() >= self.state.config.gateway.handoff_buffer_max_frames {
                return Err(GatewayError::HandoffFailed("client frame buffer exhausted during handoff".into()));
            }
            self.buffer.push(frame);
            return Ok(());
        }

        self.forward_to_upstream(frame).await
    }

    async fn forward_to_upstream(&mut self, frame: Frame) -> Result<(), GatewayError> {
        let framed = match frame {
            Frame::UserInput { text, .. } => Frame::UserInput {
                session_id: Some(self.session_id.clone()),
                text,
            },
            Frame::EndAudio { .. } => Frame::EndAudio {
                session_id: Some(self.session_id.clone()),
            },
            Frame::Ping { .. } => return Ok(()),
            Frame::SelectWorkflow { .. } => return Ok(()),
            other => {
                return Err(GatewayError::ProtocolViolation(format!(
                    "frame not valid from a client: {other:?}"
                )))
            }
        };
        self.send_upstream(&framed).await
    }

    async fn on_upstream_text(&mut self, text: String) -> Result<(), GatewayError> {
        let frame: Frame = serde_json::from_str(&text)
            .map_err(|e| GatewayError::ProtocolViolation(format!("invalid agent frame: {e}")))?;

        if let Frame::HandoffRequest { .. } = &frame {
            return self.perform_handoff(frame).await;
        }

        if let Frame::UpdateMemory { patch, .. } = &frame {
            if let Some(vu) = &patch.verified_user {
                self.state
                    .memory
                    .update_with(&self.session_id, |mem: &mut SessionMemory| {
                        mem.verified = true;
                        mem.verified_user = Some(switchboard_memory::VerifiedUser {
                            customer_name: vu.customer_name.clone(),
                            account_id: vu.account_id.clone(),
                            sort_code: vu.sort_code.clone(),
                            verified_at: chrono::Utc::now(),
                        });
                    })
                    .await
                    .map_err(GatewayError::from)?;
            }
            return Ok(());
        }

        send_client(&mut self.client, &frame).await
    }

    /// H0→H7. On any failure in H3/H4/H5 this restores
    /// `currentAgentId`, re-opens proxying to the prior upstream if it is
    /// still alive, and otherwise discards the buffer and reports a fatal
    /// error to the client.
    async fn perform_handoff(&mut self, frame: Frame) -> Result<(), GatewayError> {
        let prior_agent_id = self.current_agent_id.clone();
        let req = HandoffRequestArgs::from_frame(
            self.session_id.clone(),
            prior_agent_id.clone(),
            self.state.registry.resolve(&prior_agent_id, true).map(|a| a.routing).unwrap_or(false),
            &frame,
        )
        .ok_or_else(|| GatewayError::ProtocolViolation("malformed handoff_request".into()))?;

        self.handoff_in_flight = true; // H0

        let result: Result<(), GatewayError> = async {
            let memory = handoff::apply_memory(&self.state.memory, &req).await?; // H1
            let target = handoff::resolve_target(&self.state.registry, &req.target_agent_id)?; // H2

            self.send_upstream(&Frame::SessionEnd {
                session_id: self.session_id.clone(),
            })
            .await?; // H3
            let _ = self.upstream.close(None).await;

            let new_upstream = dial_upstream(
                &target.endpoint,
                Duration::from_millis(self.state.config.gateway.upstream_dial_timeout_ms),
            )
            .await?; // H4
            self.upstream = new_upstream;
            self.send_upstream(&Frame::SessionInit {
                session_id: self.session_id.clone(),
                inherited_memory: inherited_from_snapshot(&memory),
                trace_id: Uuid::new_v4().to_string(),
            })
            .await?;
            await_session_ack(&mut self.upstream).await?;

            for buffered in self.buffer.drain(..).collect::<Vec<_>>() {
                self.forward_to_upstream(buffered).await?; // H5
            }

            self.current_agent_id = target.agent_id.clone();
            handoff::commit_current_agent(&self.state.memory, &self.session_id, &target.agent_id).await?; // H6

            send_client(
                &mut self.client,
                &Frame::Handoff {
                    session_id: self.session_id.clone(),
                    from_agent_id: prior_agent_id.clone(),
                    to_agent_id: target.agent_id.clone(),
                    reason: req.reason.clone(),
                    is_return: req.is_return,
                },
            )
            .await?;

            Ok(())
        }
        .await;

        self.handoff_in_flight = false; // H7

        if let Err(e) = &result {
            warn!(session_id = %self.session_id, error = %e, "handoff failed, discarding buffered frames");
            self.buffer.clear();
            send_client(
                &mut self.client,
                &Frame::Error {
                    session_id: self.session_id.clone(),
                    message: format!("handoff to {} failed: {e}", req.target_agent_id),
                    fatal: true,
                },
            )
            .await
            .ok();
        }

        result
    }

    async fn send_upstream(&mut self, frame: &Frame) -> Result<(), GatewayError> {
        let text = serde_json::to_string(frame).map_err(|e| GatewayError::FatalInternal(e.to_string()))?;
        self.upstream
            .send(UpstreamMessage::Text(text))
            .await
            .map_err(GatewayError::from)
    }

    /// Returns `true` if the circuit has tripped and the session should
    /// close.
    async fn note_error(&mut self, err: &GatewayError) -> bool {
        warn!(session_id = %self.session_id, error = %err, "session error");
        send_client(
            &mut self.client,
            &Frame::Error {
                session_id: self.session_id.clone(),
                message: err.to_string(),
                fatal: err.is_fatal(),
            },
        )
        .await
        .ok();
        err.is_fatal() || self.circuit.record_error()
    }

    async fn close(mut self) {
        self.send_upstream(&Frame::SessionEnd {
            session_id: self.session_id.clone(),
        })
        .await
        .ok();
        let _ = self.upstream.close(None).await;
        let _ = self.client.send(Message::Close(None)).await;
        self.state.memory.delete(&self.session_id).await;
        info!(session_id = %self.session_id, "session closed");
    }
}

fn inherited_from_snapshot(mem: &SessionMemory) -> switchboard_runtime::InheritedMemory {
    switchboard_runtime::InheritedMemory {
        verified: mem.verified,
        verified_user: mem.verified_user.as_ref().map(|v| switchboard_runtime::VerifiedUserSnapshot {
            customer_name: v.customer_name.clone(),
            account_id: v.account_id.clone(),
            sort_code: v.sort_code.clone(),
        }),
        user_intent: mem.user_intent.clone(),
        task_summary: mem.task_summary.clone(),
    }
}

async fn wait_for_workflow_selection(client: &mut WebSocket, timeout: Duration) -> Option<String> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            return None;
        }
        match tokio::time::timeout(remaining, client.recv()).await {
            Ok(Some(Ok(Message::Text(text)))) => {
                if let Ok(Frame::SelectWorkflow { workflow_id }) = serde_json::from_str(&text) {
                    return Some(workflow_id);
                }
            }
            Ok(Some(Ok(_))) => continue,
            _ => return None,
        }
    }
}

fn resolve_agent_for_workflow(state: &AppState, workflow_id: &str) -> Result<String, GatewayError> {
    state
        .registry
        .all()
        .into_iter()
        .find(|a| a.workflow_id.as_deref() == Some(workflow_id))
        .map(|a| a.agent_id)
        .ok_or_else(|| GatewayError::UnknownAgent(format!("no agent serves workflow {workflow_id}")))
}

async fn dial_upstream(endpoint: &str, timeout: Duration) -> Result<Upstream, GatewayError> {
    let (stream, _) = tokio::time::timeout(timeout, tokio_tungstenite::connect_async(endpoint))
        .await
        .map_err(|_| GatewayError::Timeout(format!("dialing {endpoint}")))?
        .map_err(GatewayError::from)?;
    Ok(stream)
}

async fn await_session_ack(upstream: &mut Upstream) -> Result<(), GatewayError> {
    match upstream.next().await {
        Some(Ok(UpstreamMessage::Text(text))) => match serde_json::from_str::<Frame>(&text) {
            Ok(Frame::SessionAck { .. }) => Ok(()),
            Ok(other) => Err(GatewayError::ProtocolViolation(format!(
                "expected session_ack, got {other:?}"
            ))),
            Err(e) => Err(GatewayError::ProtocolViolation(e.to_string())),
        },
        Some(Ok(_)) => Err(GatewayError::ProtocolViolation("expected session_ack text frame".into())),
        Some(Err(e)) => Err(GatewayError::from(e)),
        None => Err(GatewayError::Network(std::io::Error::other("upstream closed before session_ack"))),
    }
}

async fn send_client(client: &mut WebSocket, frame: &Frame) -> Result<(), GatewayError> {
    let text = serde_json::to_string(frame).map_err(|e| GatewayError::FatalInternal(e.to_string()))?;
    client
        .send(Message::Text(text))
        .await
        .map_err(|e| GatewayError::Network(std::io::Error::other(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_config::GatewayConfig;
    use switchboard_memory::VerifiedUser;

    fn agent(id: &str, workflow_id: Option<&str>) -> switchboard_registry::Agent {
        switchboard_registry::Agent {
            agent_id: id.to_string(),
            endpoint: format!("ws://127.0.0.1:9{id}/link"),
            capabilities: vec![],
            workflow_id: workflow_id.map(str::to_string),
            routing: false,
            last_heartbeat: std::time::Instant::now(),
        }
    }

    #[test]
    fn resolve_agent_for_workflow_finds_the_serving_agent() {
        let state = AppState::new(GatewayConfig::default());
        state.registry.register(agent("banking", Some("open-account")));
        state.registry.register(agent("support", Some("support-flow")));

        let resolved = resolve_agent_for_workflow(&state, "support-flow").unwrap();
        assert_eq!(resolved, "support");
    }

    #[test]
    fn resolve_agent_for_workflow_errors_when_nothing_serves_it() {
        let state = AppState::new(GatewayConfig::default());
        state.registry.register(agent("banking", Some("open-account")));

        let err = resolve_agent_for_workflow(&state, "nonexistent").unwrap_err();
        assert!(matches!(err, GatewayError::UnknownAgent(_)));
    }

    #[test]
    fn inherited_from_snapshot_carries_verified_user_fields_through() {
        let mut mem = SessionMemory::new("banking".to_string());
        mem.verified = true;
        mem.verified_user = Some(VerifiedUser {
            customer_name: "Ada Lovelace".to_string(),
            account_id: "acc-1".to_string(),
            sort_code: "12-34-56".to_string(),
            verified_at: chrono::Utc::now(),
        });
        mem.user_intent = Some("close account".to_string());
        mem.task_summary = Some("user wants to close their account".to_string());

        let inherited = inherited_from_snapshot(&mem);

        assert!(inherited.verified);
        let vu = inherited.verified_user.expect("verified user snapshot");
        assert_eq!(vu.customer_name, "Ada Lovelace");
        assert_eq!(vu.account_id, "acc-1");
        assert_eq!(vu.sort_code, "12-34-56");
        assert_eq!(inherited.user_intent.as_deref(), Some("close account"));
        assert_eq!(inherited.task_summary.as_deref(), Some("user wants to close their account"));
    }

    #[test]
    fn inherited_from_snapshot_leaves_verified_user_absent_when_unverified() {
        let mem = SessionMemory::new("banking".to_string());
        let inherited = inherited_from_snapshot(&mem);
        assert!(!inherited.verified);
        assert!(inherited.verified_user.is_none());
    }
}
