// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Start,
    Action,
    Decision,
    ToolCall,
    Handoff,
    End,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    /// Free-form label surfaced in the textual rendering of the workflow
    /// that `InitSession` embeds in the system prompt.
    #[serde(default)]
    pub label: Option<String>,
}

/// An outbound edge. `guard: None` means unconditional (always satisfied);
/// declaration order within `Workflow::edges` is the tie-break rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub guard: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Workflow {
    pub fn start_node(&self) -> &Node {
        self.nodes
            .iter()
            .find(|n| n.kind == NodeKind::Start)
            .expect("validated at load time: exactly one start node")
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub(crate) fn outbound(&self, node_id: &str) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.from == node_id)
    }
}

/// Per-session cursor into a `Workflow`. The engine is stateless; callers
/// own one of these per session and pass it to every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub workflow_id: String,
    pub current_node_id: String,
    pub history: Vec<String>,
}

impl WorkflowState {
    pub fn new(workflow: &Workflow) -> Self {
        let start = workflow.start_node().id.clone();
        Self {
            workflow_id: workflow.id.clone(),
            history: vec![start.clone()],
            current_node_id: start,
        }
    }
}

/// A single candidate transition, as returned by `ValidNext`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub node_id: String,
    pub edge: Edge,
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to && self.guard == other.guard
    }
}
impl Eq for Edge {}
