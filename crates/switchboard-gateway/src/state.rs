// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;
use std::time::Duration;

use switchboard_config::GatewayConfig;
use switchboard_memory::MemoryStore;
use switchboard_registry::AgentRegistry;

/// Shared state threaded through every axum handler: the two gateway-owned
/// stores (C1, C2) plus the gateway's own config section. Cheap to clone —
/// everything behind it is already reference-counted or internally locked.
#[derive(Clone)]
pub struct AppState {
    pub memory: Arc<MemoryStore>,
    pub registry: Arc<AgentRegistry>,
    pub config: Arc<GatewayConfigSnapshot>,
}

/// The subset of top-level `Config` the gateway process reads, plus its own
/// derived values (e.g. the registry's heartbeat window).
pub struct GatewayConfigSnapshot {
    pub gateway: GatewayConfig,
}

impl AppState {
    pub fn new(gateway: GatewayConfig) -> Self {
        let heartbeat_window = Duration::from_millis(gateway.heartbeat_window_ms);
        Self {
            memory: Arc::new(MemoryStore::new()),
            registry: Arc::new(AgentRegistry::new(heartbeat_window)),
            config: Arc::new(GatewayConfigSnapshot { gateway }),
        }
    }
}
