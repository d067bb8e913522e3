// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Gateway-facing WebSocket link. One connection always
//! belongs to exactly one session — the Gateway dials a fresh connection
//! per session rather than multiplexing, so this handler never needs a
//! `sessionId` to tell connections apart, only to tell frames apart once
//! a session is established.
//!
//! Lifecycle: Upgrade → await `session_init` → `IoAdapter::handle_frame` ⇄
//! proxy outbound `OutboundMessage`s until either side closes.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use tracing::{debug, warn};

use switchboard_io::{Frame, IoAdapter, OutboundMessage};

use crate::state::AppState;

pub async fn link_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let Some(init_frame) = await_session_init(&mut socket).await else {
        return;
    };
    let Frame::SessionInit { session_id, .. } = &init_frame else {
        unreachable!("await_session_init only returns SessionInit frames");
    };
    let session_id = session_id.clone();

    let (out_tx, mut out_rx) = tokio::sync::mpsc::unbounded_channel::<OutboundMessage>();
    let adapter = IoAdapter::new(state.agent_id.clone(), state.core, out_tx);

    if let Err(e) = adapter.handle_frame(init_frame).await {
        warn!(session_id = %session_id, error = %e, "session_init rejected");
        return;
    }

    loop {
        tokio::select! {
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<Frame>(&text) {
                            Ok(frame) => {
                                if let Err(e) = adapter.handle_frame(frame).await {
                                    warn!(session_id = %session_id, error = %e, "frame handling failed");
                                }
                            }
                            Err(e) => warn!(session_id = %session_id, error = %e, "malformed frame from gateway"),
                        }
                    }
                    Some(Ok(Message::Binary(pcm))) => {
                        if let Err(e) = adapter.handle_user_audio(&session_id, &pcm).await {
                            warn!(session_id = %session_id, error = %e, "user audio handling failed");
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(session_id = %session_id, "gateway link recv error: {e}");
                        break;
                    }
                }
            }
            outbound = out_rx.recv() => {
                match outbound {
                    Some(OutboundMessage::Frame(frame)) => {
                        let text = match serde_json::to_string(&frame) {
                            Ok(text) => text,
                            Err(e) => {
                                warn!(session_id = %session_id, error = %e, "failed to encode outbound frame");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Some(OutboundMessage::Audio { bytes, .. }) => {
                        if socket.send(Message::Binary(bytes)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    debug!(session_id = %session_id, "gateway link closed");
}

/// The first message on a fresh connection must be `session_init`; anything
/// else means the gateway and this agent have drifted out of protocol sync.
async fn await_session_init(socket: &mut WebSocket) -> Option<Frame> {
    match socket.recv().await {
        Some(Ok(Message::Text(text))) => match serde_json::from_str::<Frame>(&text) {
            Ok(frame @ Frame::SessionInit { .. }) => Some(frame),
            Ok(other) => {
                warn!("expected session_init, got {other:?}");
                None
            }
            Err(e) => {
                warn!("malformed session_init: {e}");
                None
            }
        },
        Some(Ok(_)) => {
            warn!("expected a text session_init frame");
            None
        }
        Some(Err(e)) => {
            debug!("gateway link recv error before session_init: {e}");
            None
        }
        None => None,
    }
}
