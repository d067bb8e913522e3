// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::shared::Shared;
use crate::types::{Agent, AgentId, ResolveError};

/// Directory of live agent processes.
///
/// Registration and heartbeats are infrequent compared to `resolve` calls
/// (every session init, every handoff), so reads go through `Shared<Agent>`'s
/// atomic snapshot rather than a lock shared with writers.
pub struct AgentRegistry {
    agents: Shared<Agent>,
    heartbeat_window: Duration,
}

impl AgentRegistry {
    pub fn new(heartbeat_window: Duration) -> Self {
        Self {
            agents: Shared::empty(),
            heartbeat_window,
        }
    }

    /// `Register(agent)`, idempotent by id: a second call for the same id
    /// replaces the prior entry in place (new endpoint, capabilities, etc.)
    /// and resets its heartbeat clock.
    pub fn register(&self, mut agent: Agent) {
        agent.last_heartbeat = Instant::now();
        let mut next: Vec<Agent> = self
            .agents
            .get()
            .iter()
            .filter(|a| a.agent_id != agent.agent_id)
            .cloned()
            .collect();
        info!(agent_id = %agent.agent_id, routing = agent.routing, "agent registered");
        next.push(agent);
        self.agents.set(next);
    }

    pub fn deregister(&self, agent_id: &str) {
        let next: Vec<Agent> = self
            .agents
            .get()
            .iter()
            .filter(|a| a.agent_id != agent_id)
            .cloned()
            .collect();
        debug!(agent_id, "agent deregistered");
        self.agents.set(next);
    }

    /// `Heartbeat(agentId, timestamp)`. A heartbeat for an unknown agent is
    /// ignored — the agent must `Register` first.
    pub fn heartbeat(&self, agent_id: &str) {
        let snapshot = self.agents.get();
        let mut next: Vec<Agent> = Vec::with_capacity(snapshot.len());
        let mut found = false;
        for a in snapshot.iter() {
            if a.agent_id == agent_id {
                found = true;
                let mut refreshed = a.clone();
                refreshed.last_heartbeat = Instant::now();
                next.push(refreshed);
            } else {
                next.push(a.clone());
            }
        }
        if found {
            self.agents.set(next);
        } else {
            debug!(agent_id, "heartbeat for unregistered agent ignored");
        }
    }

    /// `Resolve(agentId) → Agent | NotFound | Unhealthy`.
    pub fn resolve(&self, agent_id: &str, include_unhealthy: bool) -> Result<Agent, ResolveError> {
        let agent = self
            .agents
            .get()
            .iter()
            .find(|a| a.agent_id == agent_id)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(agent_id.to_string()))?;

        if !include_unhealthy && !agent.is_healthy(self.heartbeat_window) {
            return Err(ResolveError::Unhealthy(agent_id.to_string()));
        }
        Ok(agent)
    }

    /// `Routing() → Agent | NotFound`. Does not apply the health filter
    /// itself — callers that need a healthy routing agent combine this with
    /// `resolve`.
    pub fn routing(&self) -> Result<Agent, ResolveError> {
        self.agents
            .get()
            .iter()
            .find(|a| a.routing)
            .cloned()
            .ok_or(ResolveError::NoRoutingAgent)
    }

    /// All agents currently tracked, healthy or not. Used by diagnostics and
    /// by tests; not part of the public contract.
    pub fn all(&self) -> Vec<Agent> {
        self.agents.get().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str, routing: bool) -> Agent {
        Agent {
            agent_id: id.to_string(),
            endpoint: format!("http://127.0.0.1:9{id}"),
            capabilities: vec![],
            workflow_id: None,
            routing,
            last_heartbeat: Instant::now(),
        }
    }

    #[test]
    fn register_is_idempotent_by_id() {
        let reg = AgentRegistry::new(Duration::from_millis(100));
        reg.register(agent("banking", false));
        reg.register(agent("banking", false));
        assert_eq!(reg.all().len(), 1);
    }

    #[test]
    fn resolve_unknown_agent_is_not_found() {
        let reg = AgentRegistry::new(Duration::from_millis(100));
        assert_eq!(
            reg.resolve("ghost", false).unwrap_err(),
            ResolveError::NotFound("ghost".into())
        );
    }

    #[test]
    fn resolve_returns_registered_agent() {
        let reg = AgentRegistry::new(Duration::from_secs(60));
        reg.register(agent("banking", false));
        let resolved = reg.resolve("banking", false).unwrap();
        assert_eq!(resolved.agent_id, "banking");
    }

    #[test]
    fn resolve_fails_closed_on_stale_heartbeat() {
        let reg = AgentRegistry::new(Duration::from_millis(10));
        reg.register(agent("banking", false));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(
            reg.resolve("banking", false).unwrap_err(),
            ResolveError::Unhealthy("banking".into())
        );
    }

    #[test]
    fn include_unhealthy_bypasses_the_health_check() {
        let reg = AgentRegistry::new(Duration::from_millis(10));
        reg.register(agent("banking", false));
        std::thread::sleep(Duration::from_millis(30));
        assert!(reg.resolve("banking", true).is_ok());
    }

    #[test]
    fn heartbeat_refreshes_liveness() {
        let reg = AgentRegistry::new(Duration::from_millis(30));
        reg.register(agent("banking", false));
        std::thread::sleep(Duration::from_millis(20));
        reg.heartbeat("banking");
        std::thread::sleep(Duration::from_millis(20));
        assert!(reg.resolve("banking", false).is_ok());
    }

    #[test]
    fn heartbeat_for_unknown_agent_is_ignored() {
        let reg = AgentRegistry::new(Duration::from_secs(60));
        reg.heartbeat("ghost");
        assert!(reg.all().is_empty());
    }

    #[test]
    fn deregister_removes_agent() {
        let reg = AgentRegistry::new(Duration::from_secs(60));
        reg.register(agent("banking", false));
        reg.deregister("banking");
        assert_eq!(
            reg.resolve("banking", false).unwrap_err(),
            ResolveError::NotFound("banking".into())
        );
    }

    #[test]
    fn routing_finds_the_single_routing_agent() {
        let reg = AgentRegistry::new(Duration::from_secs(60));
        reg.register(agent("banking", false));
        reg.register(agent("router", true));
        assert_eq!(reg.routing().unwrap().agent_id, "router");
    }

    #[test]
    fn routing_not_found_when_absent() {
        let reg = AgentRegistry::new(Duration::from_secs(60));
        reg.register(agent("banking", false));
        assert_eq!(reg.routing().unwrap_err(), ResolveError::NoRoutingAgent);
    }
}
