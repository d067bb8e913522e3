// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::classify::classify;
use crate::tool::{ToolCall, ToolKind, ToolResult};

/// Abstraction over the external executors the dispatcher routes to. The
/// dispatcher itself never runs a tool in-process — `Dispatch` always ends
/// in a call through one of these two methods.
#[async_trait]
pub trait ToolsClient: Send + Sync {
    async fn call_idv(&self, call: &ToolCall) -> ToolResult;
    async fn call_data(&self, call: &ToolCall) -> ToolResult;
}

/// Extracted from a successful IDV tool result, for the caller to fold into
/// a `MemoryUpdate` (switchboard-tools has no dependency on
/// switchboard-memory — the agent process and the memory store live in
/// different processes; this is handed back up to cross as an
/// `update_memory` wire frame).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdvVerification {
    pub customer_name: String,
    pub account_id: String,
    pub sort_code: String,
}

/// A handoff tool call was dispatched; the caller (Agent Core) is expected
/// to emit a `HandoffRequest` upstream and never re-invoke the dispatcher
/// for this call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffRequest {
    pub target_agent_id: String,
    pub is_return: bool,
}

pub struct DispatchOutcome {
    pub result: ToolResult,
    pub handoff: Option<HandoffRequest>,
    pub idv_verification: Option<IdvVerification>,
}

#[derive(Default)]
struct SessionCache {
    entries: HashMap<(String, String), ToolResult>,
}

/// Tool Dispatcher (C4).
pub struct Dispatcher {
    client: Arc<dyn ToolsClient>,
    routing_agent_id: String,
    idv_tool_names: Vec<String>,
    cacheable_tool_names: Vec<String>,
    cache: Mutex<HashMap<String, SessionCache>>,
}

impl Dispatcher {
    pub fn new(
        client: Arc<dyn ToolsClient>,
        routing_agent_id: impl Into<String>,
        idv_tool_names: Vec<String>,
        cacheable_tool_names: Vec<String>,
    ) -> Self {
        Self {
            client,
            routing_agent_id: routing_agent_id.into(),
            idv_tool_names,
            cacheable_tool_names,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// `Dispatch(toolCall, sessionContext) → ToolResult`.
    pub async fn dispatch(&self, session_id: &str, call: ToolCall) -> DispatchOutcome {
        match classify(&call.name, &self.routing_agent_id, &self.idv_tool_names) {
            ToolKind::Handoff {
                target_agent_id,
                is_return,
            } => {
                debug!(tool = %call.name, target = %target_agent_id, is_return, "handoff tool dispatched");
                DispatchOutcome {
                    result: ToolResult::handoff_pending(call.call_id),
                    handoff: Some(HandoffRequest {
                        target_agent_id,
                        is_return,
                    }),
                    idv_verification: None,
                }
            }
            ToolKind::Idv => {
                let result = self.client.call_idv(&call).await;
                let idv_verification = extract_verification(&result);
                DispatchOutcome {
                    result,
                    handoff: None,
                    idv_verification,
                }
            }
            ToolKind::Data => {
                let cacheable = self.cacheable_tool_names.iter().any(|n| n == &call.name);
                if cacheable {
                    if let Some(cached) = self.cached(session_id, &call).await {
                        debug!(tool = %call.name, "serving cached data tool result");
                        return DispatchOutcome {
                            result: cached,
                            handoff: None,
                            idv_verification: None,
                        };
                    }
                }
                let result = self.client.call_data(&call).await;
                if !result.success {
                    warn!(tool = %call.name, kind = ?result.error_kind, "data tool execution failed");
                }
                if cacheable && result.success {
                    self.store(session_id, &call, result.clone()).await;
                }
                DispatchOutcome {
                    result,
                    handoff: None,
                    idv_verification: None,
                }
            }
        }
    }

    async fn cached(&self, session_id: &str, call: &ToolCall) -> Option<ToolResult> {
        let cache = self.cache.lock().await;
        cache
            .get(session_id)?
            .entries
            .get(&cache_key(call))
            .cloned()
    }

    async fn store(&self, session_id: &str, call: &ToolCall, result: ToolResult) {
        let mut cache = self.cache.lock().await;
        cache
            .entry(session_id.to_string())
            .or_default()
            .entries
            .insert(cache_key(call), result);
    }
}

fn cache_key(call: &ToolCall) -> (String, String) {
    (
        call.name.clone(),
        serde_json::to_string(&call.args).unwrap_or_default(),
    )
}

fn extract_verification(result: &ToolResult) -> Option<IdvVerification> {
    if !result.success {
        return None;
    }
    let payload = result.payload.as_ref()?;
    if payload.get("auth_status")?.as_str()? != "VERIFIED" {
        return None;
    }
    Some(IdvVerification {
        customer_name: payload.get("customer_name")?.as_str()?.to_string(),
        account_id: payload.get("account_id")?.as_str()?.to_string(),
        sort_code: payload.get("sort_code")?.as_str()?.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingClient {
        idv_calls: AtomicUsize,
        data_calls: AtomicUsize,
        idv_response: ToolResult,
        data_response: ToolResult,
    }

    #[async_trait]
    impl ToolsClient for CountingClient {
        async fn call_idv(&self, _call: &ToolCall) -> ToolResult {
            self.idv_calls.fetch_add(1, Ordering::SeqCst);
            self.idv_response.clone()
        }
        async fn call_data(&self, _call: &ToolCall) -> ToolResult {
            self.data_calls.fetch_add(1, Ordering::SeqCst);
            self.data_response.clone()
        }
    }

    fn call(name: &str, args: serde_json::Value) -> ToolCall {
        ToolCall {
            call_id: "c1".into(),
            name: name.into(),
            args,
        }
    }

    #[tokio::test]
    async fn handoff_tool_never_reaches_the_client() {
        let client = Arc::new(CountingClient {
            idv_calls: AtomicUsize::new(0),
            data_calls: AtomicUsize::new(0),
            idv_response: ToolResult::ok("c1", json!({})),
            data_response: ToolResult::ok("c1", json!({})),
        });
        let dispatcher = Dispatcher::new(client.clone(), "router", vec![], vec![]);
        let outcome = dispatcher
            .dispatch("s1", call("transfer_to_banking", json!({})))
            .await;
        assert!(outcome.result.success);
        assert_eq!(
            outcome.handoff.unwrap(),
            HandoffRequest {
                target_agent_id: "banking".into(),
                is_return: false
            }
        );
        assert_eq!(client.idv_calls.load(Ordering::SeqCst), 0);
        assert_eq!(client.data_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn idv_success_extracts_verification() {
        let client = Arc::new(CountingClient {
            idv_calls: AtomicUsize::new(0),
            data_calls: AtomicUsize::new(0),
            idv_response: ToolResult::ok(
                "c1",
                json!({
                    "auth_status": "VERIFIED",
                    "customer_name": "Sarah",
                    "account_id": "12345678",
                    "sort_code": "112233",
                }),
            ),
            data_response: ToolResult::ok("c1", json!({})),
        });
        let dispatcher = Dispatcher::new(
            client,
            "router",
            vec!["perform_idv_check".into()],
            vec![],
        );
        let outcome = dispatcher
            .dispatch("s1", call("perform_idv_check", json!({})))
            .await;
        let verification = outcome.idv_verification.unwrap();
        assert_eq!(verification.customer_name, "Sarah");
    }

    #[tokio::test]
    async fn idv_failure_does_not_extract_verification() {
        let client = Arc::new(CountingClient {
            idv_calls: AtomicUsize::new(0),
            data_calls: AtomicUsize::new(0),
            idv_response: ToolResult::err("c1", "denied", "could not verify"),
            data_response: ToolResult::ok("c1", json!({})),
        });
        let dispatcher = Dispatcher::new(
            client,
            "router",
            vec!["perform_idv_check".into()],
            vec![],
        );
        let outcome = dispatcher
            .dispatch("s1", call("perform_idv_check", json!({})))
            .await;
        assert!(outcome.idv_verification.is_none());
    }

    #[tokio::test]
    async fn cacheable_data_tool_is_invoked_once_per_args() {
        let client = Arc::new(CountingClient {
            idv_calls: AtomicUsize::new(0),
            data_calls: AtomicUsize::new(0),
            idv_response: ToolResult::ok("c1", json!({})),
            data_response: ToolResult::ok("c1", json!({"balance": 100})),
        });
        let dispatcher = Dispatcher::new(
            client.clone(),
            "router",
            vec![],
            vec!["get_account_balance".into()],
        );
        dispatcher
            .dispatch("s1", call("get_account_balance", json!({"account": "A"})))
            .await;
        dispatcher
            .dispatch("s1", call("get_account_balance", json!({"account": "A"})))
            .await;
        assert_eq!(client.data_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_is_keyed_by_arguments_too() {
        let client = Arc::new(CountingClient {
            idv_calls: AtomicUsize::new(0),
            data_calls: AtomicUsize::new(0),
            idv_response: ToolResult::ok("c1", json!({})),
            data_response: ToolResult::ok("c1", json!({"balance": 100})),
        });
        let dispatcher = Dispatcher::new(
            client.clone(),
            "router",
            vec![],
            vec!["get_account_balance".into()],
        );
        dispatcher
            .dispatch("s1", call("get_account_balance", json!({"account": "A"})))
            .await;
        dispatcher
            .dispatch("s1", call("get_account_balance", json!({"account": "B"})))
            .await;
        assert_eq!(client.data_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cache_is_scoped_per_session() {
        let client = Arc::new(CountingClient {
            idv_calls: AtomicUsize::new(0),
            data_calls: AtomicUsize::new(0),
            idv_response: ToolResult::ok("c1", json!({})),
            data_response: ToolResult::ok("c1", json!({"balance": 100})),
        });
        let dispatcher = Dispatcher::new(
            client.clone(),
            "router",
            vec![],
            vec!["get_account_balance".into()],
        );
        dispatcher
            .dispatch("s1", call("get_account_balance", json!({"account": "A"})))
            .await;
        dispatcher
            .dispatch("s2", call("get_account_balance", json!({"account": "A"})))
            .await;
        assert_eq!(client.data_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_cacheable_data_tool_is_invoked_every_time() {
        let client = Arc::new(CountingClient {
            idv_calls: AtomicUsize::new(0),
            data_calls: AtomicUsize::new(0),
            idv_response: ToolResult::ok("c1", json!({})),
            data_response: ToolResult::ok("c1", json!({})),
        });
        let dispatcher = Dispatcher::new(client.clone(), "router", vec![], vec![]);
        dispatcher
            .dispatch("s1", call("send_sms", json!({"to": "x"})))
            .await;
        dispatcher
            .dispatch("s1", call("send_sms", json!({"to": "x"})))
            .await;
        assert_eq!(client.data_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_data_tool_does_not_kill_the_session() {
        let client = Arc::new(CountingClient {
            idv_calls: AtomicUsize::new(0),
            data_calls: AtomicUsize::new(0),
            idv_response: ToolResult::ok("c1", json!({})),
            data_response: ToolResult::err("c1", "timeout", "executor timed out"),
        });
        let dispatcher = Dispatcher::new(client, "router", vec![], vec![]);
        let outcome = dispatcher
            .dispatch("s1", call("get_account_balance", json!({})))
            .await;
        assert!(!outcome.result.success);
        assert_eq!(outcome.result.error_kind.as_deref(), Some("timeout"));
    }
}
