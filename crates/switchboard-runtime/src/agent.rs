// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use switchboard_s2s::{OpenParams, S2SClient, S2SEvent, ToolSchema};
use switchboard_tools::{Dispatcher, ToolCall as DispatchToolCall};
use switchboard_workflow::{GuardContext, NodeKind, Workflow};

use crate::error::RuntimeError;
use crate::events::AgentCoreEvent;
use crate::persona::Persona;
use crate::prompts::system_prompt;
use crate::session::{SessionContext, SessionState};
use crate::types::InheritedMemory;

/// Agent Core (C5): the voice-agnostic brain of one agent process.
///
/// Holds the agent's static identity (persona, workflow, dispatcher) plus
/// one `SessionContext` per live client session. Intended to be shared as
/// `Arc<AgentCore>` — its own session map is internally locked so callers
/// (the I/O adapter, one task per session) never need external locking.
pub struct AgentCore {
    agent_id: String,
    routing_agent_id: String,
    is_routing_agent: bool,
    auto_trigger_enabled: bool,
    voice_preset: Option<String>,
    s2s_client: Arc<dyn S2SClient>,
    dispatcher: Arc<Dispatcher>,
    workflow: Arc<Workflow>,
    persona: Arc<Persona>,
    tool_catalog: Vec<ToolSchema>,
    sessions: Mutex<HashMap<String, SessionContext>>,
}

impl AgentCore {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        agent_id: impl Into<String>,
        routing_agent_id: impl Into<String>,
        is_routing_agent: bool,
        auto_trigger_enabled: bool,
        voice_preset: Option<String>,
        s2s_client: Arc<dyn S2SClient>,
        dispatcher: Arc<Dispatcher>,
        workflow: Arc<Workflow>,
        persona: Arc<Persona>,
        tool_catalog: Vec<ToolSchema>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            routing_agent_id: routing_agent_id.into(),
            is_routing_agent,
            auto_trigger_enabled,
            voice_preset,
            s2s_client,
            dispatcher,
            workflow,
            persona,
            tool_catalog,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn handoff_tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .persona
            .handoff_targets
            .iter()
            .map(|target| format!("transfer_to_{target}"))
            .collect();
        if !self.is_routing_agent {
            names.push(format!("return_to_{}", self.routing_agent_id));
        }
        names
    }

    fn handoff_tool_schemas(&self) -> Vec<ToolSchema> {
        self.handoff_tool_names()
            .into_iter()
            .map(|name| {
                let is_return = name.starts_with("return_to_");
                let parameters = if is_return {
                    serde_json::json!({
                        "type": "object",
                        "properties": {
                            "summary": {
                                "type": "string",
                                "description": "What this agent accomplished, for the routing agent to carry forward.",
                            }
                        },
                        "required": ["summary"],
                    })
                } else {
                    serde_json::json!({
                        "type": "object",
                        "properties": {
                            "reason": {
                                "type": "string",
                                "description": "Why this conversation is being handed off.",
                            }
                        },
                        "required": ["reason"],
                    })
                };
                ToolSchema {
                    name,
                    description: "Transfer this conversation to another specialist.".into(),
                    parameters,
                }
            })
            .collect()
    }

    /// `InitSession(sessionId, inheritedMemory?) → SessionContext`.
    ///
    /// `out_tx` carries every `AgentCoreEvent` this session produces back to
    /// the I/O adapter, for the lifetime of the session.
    pub async fn init_session(
        self: &Arc<Self>,
        session_id: String,
        inherited: InheritedMemory,
        out_tx: mpsc::UnboundedSender<AgentCoreEvent>,
    ) -> Result<(), RuntimeError> {
        {
            let sessions = self.sessions.lock().await;
            if sessions.contains_key(&session_id) {
                return Err(RuntimeError::AlreadyInitialized(session_id));
            }
        }

        let workflow_state = switchboard_workflow::init(&self.workflow);
        let handoff_names = self.handoff_tool_names();
        let prompt = system_prompt(&inherited, &self.persona, &handoff_names, &self.workflow, &workflow_state);

        let mut tool_catalog = self.tool_catalog.clone();
        tool_catalog.extend(self.handoff_tool_schemas());

        let (s2s_session, mut event_rx) = self
            .s2s_client
            .open(OpenParams {
                system_prompt: prompt,
                tool_catalog,
                voice_preset: self.voice_preset.clone(),
            })
            .await
            .map_err(RuntimeError::Open)?;

        let auto_trigger_text = if self.auto_trigger_enabled && !self.is_routing_agent {
            inherited.user_intent.clone()
        } else {
            None
        };

        let mut ctx = SessionContext::new(session_id.clone(), s2s_session, workflow_state, inherited);

        if let Some(text) = auto_trigger_text {
            ctx.already_triggered = true;
            if let Err(e) = ctx.s2s_session.send_user_text(&text).await {
                warn!(session_id = %session_id, error = %e, "auto-trigger send failed");
            }
        }

        self.sessions.lock().await.insert(session_id.clone(), ctx);

        // Pump S2SEvents for this session for its lifetime. ToolCall events
        // route to OnToolCall (needs dispatch); everything else routes to
        // OnAssistantEvent.
        let this = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                match event {
                    S2SEvent::ToolCall { call_id, name, args } => {
                        let call = DispatchToolCall { call_id, name, args };
                        this.on_tool_call(&session_id, call, &out_tx).await;
                    }
                    other => this.on_assistant_event(&session_id, other, &out_tx).await,
                }
            }
            debug!(session_id = %session_id, "S2S event stream closed");
        });

        Ok(())
    }

    /// `HandleUserInput(sessionId, text)`.
    pub async fn handle_user_input(&self, session_id: &str, text: &str) -> Result<(), RuntimeError> {
        let mut sessions = self.sessions.lock().await;
        let ctx = sessions
            .get_mut(session_id)
            .ok_or_else(|| RuntimeError::SessionNotFound(session_id.to_string()))?;
        ctx.state = SessionState::Active;
        ctx.s2s_session
            .send_user_text(text)
            .await
            .map_err(RuntimeError::Open)
    }

    /// `OnToolCall(sessionId, toolCall)`.
    async fn on_tool_call(
        &self,
        session_id: &str,
        call: DispatchToolCall,
        out_tx: &mpsc::UnboundedSender<AgentCoreEvent>,
    ) {
        let outcome = self.dispatcher.dispatch(session_id, call.clone()).await;

        let mut sessions = self.sessions.lock().await;
        let Some(ctx) = sessions.get_mut(session_id) else {
            warn!(session_id, "tool call result for unknown session dropped");
            return;
        };
        ctx.state = SessionState::Active;

        let result_value = outcome
            .result
            .payload
            .clone()
            .unwrap_or(serde_json::Value::Null);
        if let Err(e) = ctx
            .s2s_session
            .send_tool_result(&call.call_id, result_value.clone(), !outcome.result.success)
            .await
        {
            warn!(session_id, error = %e, "send_tool_result failed");
        }

        if let Some(handoff) = outcome.handoff {
            let reason = call.args.get("reason").and_then(|v| v.as_str()).map(str::to_string);
            let task_completed = if handoff.is_return {
                call.args.get("summary").and_then(|v| v.as_str()).map(str::to_string)
            } else {
                None
            };
            let _ = out_tx.send(AgentCoreEvent::HandoffRequest {
                target_agent_id: handoff.target_agent_id,
                reason,
                is_return: handoff.is_return,
                task_completed,
                inherited_memory: ctx.memory.clone(),
            });
            return;
        }

        if let Some(verification) = outcome.idv_verification {
            ctx.memory.verified = true;
            ctx.memory.verified_user = Some(crate::types::VerifiedUserSnapshot {
                customer_name: verification.customer_name.clone(),
                account_id: verification.account_id.clone(),
                sort_code: verification.sort_code.clone(),
            });
            let _ = out_tx.send(AgentCoreEvent::UpdateMemory {
                verified_user: Some(verification),
            });
        }

        // Advance the workflow when the current node is a `toolcall` node
        // and a matching edge guard fires.
        if let Some(node) = self.workflow.node(&ctx.workflow_state.current_node_id) {
            if node.kind == NodeKind::ToolCall {
                let guard_ctx = GuardContext {
                    verified: ctx.memory.verified,
                    user_intent: ctx.memory.user_intent.clone(),
                    current_agent_id: Some(self.agent_id.clone()),
                    tool_result: Some(result_value),
                };
                self.try_advance(ctx, &guard_ctx, NodeKind::ToolCall, out_tx);
            }
        }
    }

    /// `HandleUserInput`'s audio counterpart — inbound audio binary frames
    /// route straight to the S2S session.
    pub async fn handle_user_audio(&self, session_id: &str, frame: &[u8]) -> Result<(), RuntimeError> {
        let mut sessions = self.sessions.lock().await;
        let ctx = sessions
            .get_mut(session_id)
            .ok_or_else(|| RuntimeError::SessionNotFound(session_id.to_string()))?;
        ctx.state = SessionState::Active;
        ctx.s2s_session
            .send_user_audio(frame)
            .await
            .map_err(RuntimeError::Open)
    }

    /// `OnAssistantEvent(sessionId, event)`.
    async fn on_assistant_event(
        &self,
        session_id: &str,
        event: S2SEvent,
        out_tx: &mpsc::UnboundedSender<AgentCoreEvent>,
    ) {
        let mut sessions = self.sessions.lock().await;
        let Some(ctx) = sessions.get_mut(session_id) else {
            warn!(session_id, "assistant event for unknown session dropped");
            return;
        };
        ctx.state = SessionState::Active;

        match event {
            S2SEvent::AssistantText(text) => {
                let _ = out_tx.send(AgentCoreEvent::Transcript {
                    role: "assistant",
                    text,
                    is_final: true,
                });
            }
            S2SEvent::AssistantAudio(frame) => {
                let _ = out_tx.send(AgentCoreEvent::AudioOut(frame));
            }
            S2SEvent::UsageReport { .. } | S2SEvent::Interruption => {}
            S2SEvent::Error(message) => {
                let _ = out_tx.send(AgentCoreEvent::Error { message, fatal: false });
            }
            S2SEvent::ToolCall { .. } => unreachable!("routed to on_tool_call by the caller"),
        }

        // Decision nodes are evaluated opportunistically on every assistant
        // event using the session's current memory as guard context — no
        // tool result is involved for a pure `decision` node.
        if let Some(node) = self.workflow.node(&ctx.workflow_state.current_node_id) {
            if node.kind == NodeKind::Decision {
                let guard_ctx = GuardContext {
                    verified: ctx.memory.verified,
                    user_intent: ctx.memory.user_intent.clone(),
                    current_agent_id: Some(self.agent_id.clone()),
                    tool_result: None,
                };
                self.try_advance(ctx, &guard_ctx, NodeKind::Decision, out_tx);
            }
        }
    }

    /// Attempt the single satisfied transition out of the session's current
    /// node; emits `WorkflowUpdate` on success (and `DecisionMade` when the
    /// node being resolved is a `decision` node). A dead end (no satisfied
    /// edge) is left as-is — non-fatal.
    fn try_advance(
        &self,
        ctx: &mut SessionContext,
        guard_ctx: &GuardContext,
        from_kind: NodeKind,
        out_tx: &mpsc::UnboundedSender<AgentCoreEvent>,
    ) {
        let Some(transition) = switchboard_workflow::decide(&self.workflow, &ctx.workflow_state, guard_ctx) else {
            return;
        };
        match switchboard_workflow::advance(&self.workflow, &ctx.workflow_state, &transition.node_id, guard_ctx) {
            Ok(next_state) => {
                if from_kind == NodeKind::Decision {
                    let _ = out_tx.send(AgentCoreEvent::DecisionMade {
                        node_id: ctx.workflow_state.current_node_id.clone(),
                        chosen_edge: transition.edge.guard.clone().unwrap_or_default(),
                        reasoning: None,
                    });
                }
                ctx.workflow_state = next_state;
                let next_nodes: Vec<String> = switchboard_workflow::valid_next(&self.workflow, &ctx.workflow_state, guard_ctx)
                    .into_iter()
                    .map(|t| t.node_id)
                    .collect();
                let node_type = self
                    .workflow
                    .node(&ctx.workflow_state.current_node_id)
                    .map(|n| n.kind)
                    .unwrap_or(NodeKind::End);
                let _ = out_tx.send(AgentCoreEvent::WorkflowUpdate {
                    current_node_id: ctx.workflow_state.current_node_id.clone(),
                    node_type,
                    next_nodes,
                    valid_transition: true,
                });
            }
            Err(e) => {
                warn!(error = %e, "workflow advance rejected after decide returned a candidate");
            }
        }
    }

    /// `EndSession(sessionId)`. Does not clear SessionMemory —
    /// that belongs to the Gateway (C1).
    pub async fn end_session(&self, session_id: &str) -> Result<(), RuntimeError> {
        let mut sessions = self.sessions.lock().await;
        let Some(mut ctx) = sessions.remove(session_id) else {
            return Err(RuntimeError::SessionNotFound(session_id.to_string()));
        };
        ctx.state = SessionState::Closing;
        let _ = ctx.s2s_session.close().await;
        Ok(())
    }

    pub async fn session_state(&self, session_id: &str) -> Option<SessionState> {
        self.sessions.lock().await.get(session_id).map(|c| c.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_s2s::ScriptedMockClient;
    use switchboard_tools::{ToolResult, ToolsClient};
    use switchboard_workflow::{Edge, Node};

    fn workflow() -> Arc<Workflow> {
        Arc::new(Workflow {
            id: "banking".into(),
            nodes: vec![
                Node { id: "begin".into(), kind: NodeKind::Start, label: None },
                Node { id: "fetch".into(), kind: NodeKind::ToolCall, label: None },
                Node { id: "end".into(), kind: NodeKind::End, label: None },
            ],
            edges: vec![
                Edge { from: "begin".into(), to: "fetch".into(), guard: None },
                Edge {
                    from: "fetch".into(),
                    to: "end".into(),
                    guard: Some(r#"toolResult.status == "ok""#.into()),
                },
            ],
        })
    }

    fn persona() -> Arc<Persona> {
        Arc::new(Persona {
            system_prompt: "You are the banking specialist.".into(),
            handoff_targets: vec!["routing".into()],
        })
    }

    struct NoopToolsClient;
    #[async_trait::async_trait]
    impl ToolsClient for NoopToolsClient {
        async fn call_idv(&self, call: &DispatchToolCall) -> ToolResult {
            ToolResult::ok(&call.call_id, serde_json::json!({}))
        }
        async fn call_data(&self, call: &DispatchToolCall) -> ToolResult {
            ToolResult::ok(&call.call_id, serde_json::json!({"status": "ok"}))
        }
    }

    fn core() -> Arc<AgentCore> {
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(NoopToolsClient), "routing", vec![], vec![]));
        let client: Arc<dyn S2SClient> = Arc::new(ScriptedMockClient::always_text("hi there"));
        Arc::new(AgentCore::new(
            "banking",
            "routing",
            false,
            false,
            None,
            client,
            dispatcher,
            workflow(),
            persona(),
            vec![],
        ))
    }

    #[tokio::test]
    async fn init_session_opens_with_persona_and_handoff_tools() {
        let agent = core();
        let (tx, _rx) = mpsc::unbounded_channel();
        agent
            .init_session("s1".into(), InheritedMemory::default(), tx)
            .await
            .unwrap();
        assert_eq!(agent.session_state("s1").await, Some(SessionState::Initialized));
    }

    #[tokio::test]
    async fn double_init_is_rejected() {
        let agent = core();
        let (tx, _rx) = mpsc::unbounded_channel();
        agent
            .init_session("s1".into(), InheritedMemory::default(), tx.clone())
            .await
            .unwrap();
        let result = agent.init_session("s1".into(), InheritedMemory::default(), tx).await;
        assert!(matches!(result, Err(RuntimeError::AlreadyInitialized(_))));
    }

    #[tokio::test]
    async fn handle_user_input_marks_session_active() {
        let agent = core();
        let (tx, _rx) = mpsc::unbounded_channel();
        agent
            .init_session("s1".into(), InheritedMemory::default(), tx)
            .await
            .unwrap();
        agent.handle_user_input("s1", "hello").await.unwrap();
        assert_eq!(agent.session_state("s1").await, Some(SessionState::Active));
    }

    #[tokio::test]
    async fn handle_user_input_on_unknown_session_errors() {
        let agent = core();
        let result = agent.handle_user_input("missing", "hello").await;
        assert!(matches!(result, Err(RuntimeError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn end_session_removes_context() {
        let agent = core();
        let (tx, _rx) = mpsc::unbounded_channel();
        agent
            .init_session("s1".into(), InheritedMemory::default(), tx)
            .await
            .unwrap();
        agent.end_session("s1").await.unwrap();
        assert_eq!(agent.session_state("s1").await, None);
    }

    #[tokio::test]
    async fn tool_call_on_toolcall_node_advances_workflow_when_guard_fires() {
        let agent = core();
        let (tx, mut rx) = mpsc::unbounded_channel();
        agent
            .init_session("s1".into(), InheritedMemory::default(), tx.clone())
            .await
            .unwrap();
        {
            let mut sessions = agent.sessions.lock().await;
            sessions.get_mut("s1").unwrap().workflow_state.current_node_id = "fetch".into();
        }
        let call = DispatchToolCall {
            call_id: "c1".into(),
            name: "get_account_balance".into(),
            args: serde_json::json!({}),
        };
        agent.on_tool_call("s1", call, &tx).await;

        let mut saw_workflow_update = false;
        while let Ok(event) = rx.try_recv() {
            if let AgentCoreEvent::WorkflowUpdate { current_node_id, .. } = event {
                assert_eq!(current_node_id, "end");
                saw_workflow_update = true;
            }
        }
        assert!(saw_workflow_update, "expected a WorkflowUpdate event");
    }

    #[tokio::test]
    async fn handoff_tool_call_bubbles_handoff_request_without_advancing_workflow() {
        let agent = core();
        let (tx, mut rx) = mpsc::unbounded_channel();
        agent
            .init_session("s1".into(), InheritedMemory::default(), tx.clone())
            .await
            .unwrap();
        let call = DispatchToolCall {
            call_id: "c1".into(),
            name: "transfer_to_disputes".into(),
            args: serde_json::json!({"reason": "dispute a charge"}),
        };
        agent.on_tool_call("s1", call, &tx).await;

        let mut saw_handoff = false;
        while let Ok(event) = rx.try_recv() {
            if let AgentCoreEvent::HandoffRequest { target_agent_id, is_return, reason, .. } = event {
                assert_eq!(target_agent_id, "disputes");
                assert!(!is_return);
                assert_eq!(reason.as_deref(), Some("dispute a charge"));
                saw_handoff = true;
            }
        }
        assert!(saw_handoff);
        assert_eq!(
            agent
                .sessions
                .lock()
                .await
                .get("s1")
                .unwrap()
                .workflow_state
                .current_node_id,
            "begin"
        );
    }

    #[tokio::test]
    async fn return_handoff_reads_task_completed_from_tool_args() {
        let agent = core();
        let (tx, mut rx) = mpsc::unbounded_channel();
        agent
            .init_session("s1".into(), InheritedMemory::default(), tx.clone())
            .await
            .unwrap();
        let call = DispatchToolCall {
            call_id: "c1".into(),
            name: "return_to_routing".into(),
            args: serde_json::json!({"summary": "balance retrieved"}),
        };
        agent.on_tool_call("s1", call, &tx).await;

        let mut saw_handoff = false;
        while let Ok(event) = rx.try_recv() {
            if let AgentCoreEvent::HandoffRequest { is_return, task_completed, .. } = event {
                assert!(is_return);
                assert_eq!(task_completed.as_deref(), Some("balance retrieved"));
                saw_handoff = true;
            }
        }
        assert!(saw_handoff);
    }
}
