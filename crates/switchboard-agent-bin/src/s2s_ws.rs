// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! A provider-agnostic `S2SClient`: opens one WebSocket per
//! session against an external S2S endpoint and translates its JSON event
//! stream into `S2SEvent`. Carries no opinion about which model or voice
//! vendor sits behind `s2s_endpoint` — only the small duplex JSON protocol
//! this client and that endpoint agree on.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use switchboard_s2s::{OpenParams, S2SClient, S2SEvent, S2SSession};

pub struct WsS2SClient {
    endpoint: String,
}

impl WsS2SClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into() }
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutboundMessage<'a> {
    Open {
        system_prompt: &'a str,
        tool_catalog: &'a [switchboard_s2s::ToolSchema],
        voice_preset: &'a Option<String>,
    },
    UserText {
        text: &'a str,
    },
    UserAudio {
        #[serde(with = "base64_bytes")]
        frame: &'a [u8],
    },
    ToolResult {
        call_id: &'a str,
        result: &'a Value,
        is_error: bool,
    },
    Close,
}

#[async_trait]
impl S2SClient for WsS2SClient {
    async fn open(
        &self,
        params: OpenParams,
    ) -> anyhow::Result<(Box<dyn S2SSession>, mpsc::UnboundedReceiver<S2SEvent>)> {
        let (stream, _) = tokio_tungstenite::connect_async(&self.endpoint)
            .await
            .map_err(|e| anyhow::anyhow!("dialing S2S provider {}: {e}", self.endpoint))?;
        let (mut write, mut read) = stream.split();

        let open_msg = OutboundMessage::Open {
            system_prompt: &params.system_prompt,
            tool_catalog: &params.tool_catalog,
            voice_preset: &params.voice_preset,
        };
        write
            .send(Message::Text(serde_json::to_string(&open_msg)?))
            .await
            .map_err(|e| anyhow::anyhow!("sending open to S2S provider: {e}"))?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => match decode_event(&text) {
                        Some(event) => {
                            if event_tx.send(event).is_err() {
                                break;
                            }
                        }
                        None => warn!("unrecognized S2S provider event: {text}"),
                    },
                    Ok(Message::Binary(audio)) => {
                        if event_tx.send(S2SEvent::AssistantAudio(audio)).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!("S2S provider connection error: {e}");
                        break;
                    }
                }
            }
        });

        Ok((Box::new(WsS2SSession { write: tokio::sync::Mutex::new(write) }), event_rx))
    }
}

type Writer = futures::stream::SplitSink<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    Message,
>;

struct WsS2SSession {
    write: tokio::sync::Mutex<Writer>,
}

#[async_trait]
impl S2SSession for WsS2SSession {
    async fn send_user_text(&self, text: &str) -> anyhow::Result<()> {
        self.send(OutboundMessage::UserText { text }).await
    }

    async fn send_user_audio(&self, frame: &[u8]) -> anyhow::Result<()> {
        self.send(OutboundMessage::UserAudio { frame }).await
    }

    async fn send_tool_result(&self, call_id: &str, result: Value, is_error: bool) -> anyhow::Result<()> {
        self.send(OutboundMessage::ToolResult { call_id, result: &result, is_error }).await
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.send(OutboundMessage::Close).await
    }
}

impl WsS2SSession {
    async fn send(&self, msg: OutboundMessage<'_>) -> anyhow::Result<()> {
        let text = serde_json::to_string(&msg)?;
        self.write
            .lock()
            .await
            .send(Message::Text(text))
            .await
            .map_err(|e| anyhow::anyhow!("writing to S2S provider: {e}"))
    }
}

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InboundMessage {
    AssistantText { text: String },
    ToolCall { call_id: String, name: String, args: Value },
    Usage { input_tokens: u32, output_tokens: u32 },
    Interruption,
    Error { message: String },
}

fn decode_event(text: &str) -> Option<S2SEvent> {
    let msg: InboundMessage = serde_json::from_str(text).ok()?;
    Some(match msg {
        InboundMessage::AssistantText { text } => S2SEvent::AssistantText(text),
        InboundMessage::ToolCall { call_id, name, args } => S2SEvent::ToolCall { call_id, name, args },
        InboundMessage::Usage { input_tokens, output_tokens } => {
            S2SEvent::UsageReport { input_tokens, output_tokens }
        }
        InboundMessage::Interruption => S2SEvent::Interruption,
        InboundMessage::Error { message } => S2SEvent::Error(message),
    })
}

mod base64_bytes {
    use base64::Engine;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &&[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }
}
