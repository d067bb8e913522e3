// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::client::{OpenParams, S2SClient, S2SSession};
use crate::events::S2SEvent;

/// A pre-scripted `S2SClient` for tests. Each call to `open` pops the next
/// event script from the front of the queue and emits it immediately on the
/// returned channel — no network access, fully deterministic.
pub struct ScriptedMockClient {
    scripts: Arc<Mutex<Vec<Vec<S2SEvent>>>>,
    /// The most recent `OpenParams` seen, for tests to inspect the prompt
    /// that was built (e.g. to assert on system-prompt ordering).
    pub last_open: Arc<Mutex<Option<OpenParams>>>,
}

impl ScriptedMockClient {
    pub fn new(scripts: Vec<Vec<S2SEvent>>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts)),
            last_open: Arc::new(Mutex::new(None)),
        }
    }

    /// Convenience: a client whose single session immediately emits one
    /// text reply.
    pub fn always_text(reply: impl Into<String>) -> Self {
        Self::new(vec![vec![
            S2SEvent::AssistantText(reply.into()),
            S2SEvent::UsageReport {
                input_tokens: 5,
                output_tokens: 5,
            },
        ]])
    }
}

#[async_trait]
impl S2SClient for ScriptedMockClient {
    async fn open(
        &self,
        params: OpenParams,
    ) -> anyhow::Result<(Box<dyn S2SSession>, mpsc::UnboundedReceiver<S2SEvent>)> {
        *self.last_open.lock().unwrap() = Some(params);

        let script = self.scripts.lock().unwrap().pop().unwrap_or_default();
        let (tx, rx) = mpsc::unbounded_channel();
        for event in script {
            let _ = tx.send(event);
        }
        Ok((Box::new(MockSession { tx }), rx))
    }
}

struct MockSession {
    tx: mpsc::UnboundedSender<S2SEvent>,
}

#[async_trait]
impl S2SSession for MockSession {
    async fn send_user_text(&self, text: &str) -> anyhow::Result<()> {
        let _ = self.tx.send(S2SEvent::AssistantText(format!("echo:{text}")));
        Ok(())
    }

    async fn send_user_audio(&self, _frame: &[u8]) -> anyhow::Result<()> {
        Ok(())
    }

    async fn send_tool_result(&self, _call_id: &str, _result: Value, _is_error: bool) -> anyhow::Result<()> {
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_emits_the_scripted_events_in_order() {
        let client = ScriptedMockClient::always_text("hello there");
        let (_, mut rx) = client
            .open(OpenParams {
                system_prompt: "you are a helpful agent".into(),
                tool_catalog: vec![],
                voice_preset: None,
            })
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            S2SEvent::AssistantText(text) => assert_eq!(text, "hello there"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(matches!(rx.recv().await.unwrap(), S2SEvent::UsageReport { .. }));
    }

    #[tokio::test]
    async fn last_open_records_the_system_prompt() {
        let client = ScriptedMockClient::always_text("hi");
        client
            .open(OpenParams {
                system_prompt: "prompt text".into(),
                tool_catalog: vec![],
                voice_preset: Some("warm".into()),
            })
            .await
            .unwrap();
        let recorded = client.last_open.lock().unwrap().clone().unwrap();
        assert_eq!(recorded.system_prompt, "prompt text");
        assert_eq!(recorded.voice_preset.as_deref(), Some("warm"));
    }
}
