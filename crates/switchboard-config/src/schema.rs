// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};

/// Serde default helper — returns `true`.
///
/// Used for config fields that should be enabled unless the user explicitly
/// sets them to `false`.  `#[serde(default)]` on a `bool` always falls back
/// to `bool::default()` (i.e. `false`), so a named function is required.
fn default_true() -> bool {
    true
}

/// Top-level configuration shared by the gateway and agent processes.
///
/// A given process only reads the section relevant to its own role; the
/// other section keeps its defaults. Loading a gateway-only config file from
/// an agent process (or vice versa) is harmless.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub agent: AgentProcessConfig,
}

/// I/O mode an agent process operates in.
///
/// Read once from `MODE` at process startup and immutable
/// for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IoMode {
    Voice,
    Text,
    Hybrid,
}

impl Default for IoMode {
    fn default() -> Self {
        IoMode::Text
    }
}

impl std::fmt::Display for IoMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IoMode::Voice => "voice",
            IoMode::Text => "text",
            IoMode::Hybrid => "hybrid",
        };
        write!(f, "{s}")
    }
}

/// Configuration for the gateway process (C1/C2/C7/C8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Address the client-facing WebSocket server binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// How long (ms) the gateway waits for `select_workflow` before falling
    /// back to the routing agent.
    #[serde(default = "default_select_timeout_ms")]
    pub select_workflow_timeout_ms: u64,
    /// Window (ms) within which an agent's last heartbeat must fall to be
    /// considered healthy. Recommended 3x the agent's heartbeat period.
    #[serde(default = "default_heartbeat_window_ms")]
    pub heartbeat_window_ms: u64,
    /// Grace period (ms) SessionMemory survives after client disconnect,
    /// to tolerate reconnects.
    #[serde(default = "default_grace_period_ms")]
    pub session_grace_period_ms: u64,
    /// Maximum frames buffered per session during a handoff.
    #[serde(default = "default_handoff_buffer_max_frames")]
    pub handoff_buffer_max_frames: usize,
    /// Session-level circuit breaker: error count threshold.
    #[serde(default = "default_max_session_errors")]
    pub max_session_errors: u32,
    /// Session-level circuit breaker: rolling window (ms).
    #[serde(default = "default_error_window_ms")]
    pub error_window_ms: u64,
    /// Bounded timeout (ms) for dialing an upstream agent.
    #[serde(default = "default_upstream_dial_timeout_ms")]
    pub upstream_dial_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            select_workflow_timeout_ms: default_select_timeout_ms(),
            heartbeat_window_ms: default_heartbeat_window_ms(),
            session_grace_period_ms: default_grace_period_ms(),
            handoff_buffer_max_frames: default_handoff_buffer_max_frames(),
            max_session_errors: default_max_session_errors(),
            error_window_ms: default_error_window_ms(),
            upstream_dial_timeout_ms: default_upstream_dial_timeout_ms(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8700".to_string()
}
fn default_select_timeout_ms() -> u64 {
    5_000
}
fn default_heartbeat_window_ms() -> u64 {
    45_000
}
fn default_grace_period_ms() -> u64 {
    30_000
}
fn default_handoff_buffer_max_frames() -> usize {
    256
}
fn default_max_session_errors() -> u32 {
    5
}
fn default_error_window_ms() -> u64 {
    10_000
}
fn default_upstream_dial_timeout_ms() -> u64 {
    5_000
}

/// Configuration for a single agent process (C3/C4/C5/C6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProcessConfig {
    /// Stable agent identifier, also used as the handoff tool suffix
    /// (`transfer_to_<agentId>` / `return_to_<agentId>`).
    #[serde(default)]
    pub agent_id: String,
    /// I/O mode this process operates in.
    #[serde(default)]
    pub mode: IoMode,
    /// Path to this agent's workflow graph (YAML).
    #[serde(default)]
    pub workflow_file: Option<std::path::PathBuf>,
    /// Path to this agent's persona config (YAML).
    #[serde(default)]
    pub persona_file: Option<std::path::PathBuf>,
    /// Gateway endpoint used for agent registration and heartbeats.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    /// Heartbeat cadence (ms) sent to the gateway.
    #[serde(default = "default_heartbeat_period_ms")]
    pub heartbeat_period_ms: u64,
    /// Whether this agent proactively sends a synthetic trigger utterance
    /// reconstructed from an inherited `userIntent`.
    #[serde(default)]
    pub auto_trigger_enabled: bool,
    /// Declares this agent as the routing agent (owns user intent, is the
    /// return target for `isReturn` handoffs).
    #[serde(default)]
    pub routing: bool,
    /// Agent id of the routing agent, used to classify `return_to_<id>`
    /// tool calls regardless of whether this process is itself
    /// the routing agent.
    #[serde(default = "default_routing_agent_id")]
    pub routing_agent_id: String,
    /// Declares this agent performs identity verification.
    #[serde(default)]
    pub verification_required: bool,
    /// Names of identity-verification tools this agent may call.
    #[serde(default)]
    pub idv_tool_names: Vec<String>,
    /// Names of data tools this agent may call (tool scope filter).
    #[serde(default)]
    pub tool_scopes: Vec<String>,
    /// Names of data tools whose result the dispatcher may cache per session.
    #[serde(default)]
    pub cacheable_tool_names: Vec<String>,
    /// Path to the JSON/YAML tool catalog (name, description, JSON Schema
    /// parameters) this agent advertises, filtered by `tool_scopes` before
    /// being handed to `S2SClient::Open`.
    #[serde(default)]
    pub tools_catalog_file: Option<std::path::PathBuf>,
    /// Voice preset forwarded to `S2SClient::Open`. Ignored in text mode.
    #[serde(default)]
    pub voice_preset: Option<String>,
    /// Per-call tool dispatch timeout (ms).
    #[serde(default = "default_tool_timeout_ms")]
    pub tool_timeout_ms: u64,
    /// Whether the agent auto-approves every data tool without caching logic
    /// beyond what C4 declares cacheable by name. Reserved for future use;
    /// currently always true (no tool-level approval gate in this core).
    #[serde(default = "default_true")]
    pub auto_approve_data_tools: bool,
    /// Address this agent process's gateway-facing WebSocket link server
    /// binds to. Registered with the gateway as this agent's `endpoint`.
    #[serde(default = "default_link_bind")]
    pub link_bind: String,
    /// WebSocket URL of the external S2S provider this agent opens sessions
    /// against.
    #[serde(default = "default_s2s_endpoint")]
    pub s2s_endpoint: String,
    /// HTTP base URL of the external tool executor (`/idv`, `/data` routes).
    #[serde(default = "default_tools_endpoint")]
    pub tools_endpoint: String,
}

impl Default for AgentProcessConfig {
    fn default() -> Self {
        Self {
            agent_id: String::new(),
            mode: IoMode::default(),
            workflow_file: None,
            persona_file: None,
            gateway_url: default_gateway_url(),
            heartbeat_period_ms: default_heartbeat_period_ms(),
            auto_trigger_enabled: false,
            routing: false,
            routing_agent_id: default_routing_agent_id(),
            verification_required: false,
            idv_tool_names: Vec::new(),
            tool_scopes: Vec::new(),
            cacheable_tool_names: Vec::new(),
            tools_catalog_file: None,
            voice_preset: None,
            tool_timeout_ms: default_tool_timeout_ms(),
            auto_approve_data_tools: true,
            link_bind: default_link_bind(),
            s2s_endpoint: default_s2s_endpoint(),
            tools_endpoint: default_tools_endpoint(),
        }
    }
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:8700".to_string()
}
fn default_heartbeat_period_ms() -> u64 {
    15_000
}
fn default_routing_agent_id() -> String {
    "routing".to_string()
}
fn default_tool_timeout_ms() -> u64 {
    10_000
}
fn default_link_bind() -> String {
    "0.0.0.0:8800".to_string()
}
fn default_s2s_endpoint() -> String {
    "ws://127.0.0.1:8901/s2s".to_string()
}
fn default_tools_endpoint() -> String {
    "http://127.0.0.1:8902".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_gateway_bind() {
        let cfg = Config::default();
        assert_eq!(cfg.gateway.bind, "0.0.0.0:8700");
    }

    #[test]
    fn default_heartbeat_window_is_three_times_period() {
        let cfg = Config::default();
        assert_eq!(
            cfg.gateway.heartbeat_window_ms,
            3 * cfg.agent.heartbeat_period_ms
        );
    }

    #[test]
    fn io_mode_serializes_lowercase() {
        let s = serde_yaml::to_string(&IoMode::Hybrid).unwrap();
        assert_eq!(s.trim(), "hybrid");
    }

    #[test]
    fn io_mode_display() {
        assert_eq!(IoMode::Voice.to_string(), "voice");
        assert_eq!(IoMode::Text.to_string(), "text");
        assert_eq!(IoMode::Hybrid.to_string(), "hybrid");
    }

    #[test]
    fn agent_process_config_defaults_not_routing() {
        let cfg = AgentProcessConfig::default();
        assert!(!cfg.routing);
        assert!(!cfg.verification_required);
        assert!(cfg.idv_tool_names.is_empty());
    }

    #[test]
    fn deserialize_partial_yaml_fills_defaults() {
        let yaml = "agent:\n  agent_id: routing\n  routing: true\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.agent.agent_id, "routing");
        assert!(cfg.agent.routing);
        assert_eq!(cfg.gateway.bind, "0.0.0.0:8700");
    }
}
