// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use crate::error::WorkflowError;
use crate::guard::{evaluate, GuardContext};
use crate::types::{Transition, Workflow, WorkflowState};

/// `Init(workflowId) → WorkflowState` starting at the workflow's `start`.
pub fn init(workflow: &Workflow) -> WorkflowState {
    WorkflowState::new(workflow)
}

/// `Reset(workflowId) → WorkflowState`. Used on handoff: the target agent's
/// workflow always starts fresh, no state carried across agents.
pub fn reset(workflow: &Workflow) -> WorkflowState {
    WorkflowState::new(workflow)
}

/// `ValidNext(state) → list of {nodeId, edge}`, guards evaluated against
/// `context`, preserving declaration order.
pub fn valid_next(workflow: &Workflow, state: &WorkflowState, context: &GuardContext) -> Vec<Transition> {
    workflow
        .outbound(&state.current_node_id)
        .filter(|edge| match &edge.guard {
            None => true,
            Some(guard) => evaluate(guard, context),
        })
        .map(|edge| Transition {
            node_id: edge.to.clone(),
            edge: edge.clone(),
        })
        .collect()
}

/// `Advance(state, targetNodeId, context) → state' | InvalidTransition`.
///
/// `targetNodeId` must be reachable via an outbound edge from the current
/// node whose guard (if any) is satisfied. When several outbound edges are
/// satisfied, declaration order in the graph breaks the tie — but advancing
/// to a specific `targetNodeId` only needs that one edge to be valid, not
/// that it be first.
pub fn advance(
    workflow: &Workflow,
    state: &WorkflowState,
    target_node_id: &str,
    context: &GuardContext,
) -> Result<WorkflowState, WorkflowError> {
    let candidates = valid_next(workflow, state, context);
    if !candidates.iter().any(|t| t.node_id == target_node_id) {
        return Err(WorkflowError::InvalidTransition {
            from: state.current_node_id.clone(),
            to: target_node_id.to_string(),
        });
    }

    let mut next = state.clone();
    next.current_node_id = target_node_id.to_string();
    next.history.push(target_node_id.to_string());
    Ok(next)
}

/// Evaluates the decision at the current node and returns the single
/// satisfied edge, per declaration order. A `decision` node with
/// no satisfied edge is a non-fatal dead end — the caller treats a `None`
/// here as "surface an error event, keep the session open" rather than
/// retrying.
pub fn decide(workflow: &Workflow, state: &WorkflowState, context: &GuardContext) -> Option<Transition> {
    valid_next(workflow, state, context).into_iter().next()
}
