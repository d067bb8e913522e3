// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! System-prompt construction.
//!
//! `InitSession` concatenates four blocks in a fixed, load-bearing order:
//! inherited-memory context, persona, handoff-tools instructions, and the
//! workflow's textual rendering. Reordering these causes the model to
//! re-ask for facts it was already told.

use switchboard_workflow::{Workflow, WorkflowState};

use crate::persona::Persona;
use crate::types::InheritedMemory;

/// (a) Context injection block: verified-user fields and current intent, or
/// nothing when the session carries no inherited memory.
fn context_block(inherited: &InheritedMemory) -> Option<String> {
    if !inherited.verified && inherited.user_intent.is_none() && inherited.task_summary.is_none() {
        return None;
    }

    let mut lines = vec!["## Known Session Context".to_string()];
    if let Some(user) = &inherited.verified_user {
        lines.push(format!(
            "- The caller has already been identity-verified as {} (account {}, sort code {}). \
             Do not ask them to verify again.",
            user.customer_name, user.account_id, user.sort_code
        ));
    } else if inherited.verified {
        lines.push("- The caller has already been identity-verified. Do not re-verify.".into());
    }
    if let Some(intent) = &inherited.user_intent {
        lines.push(format!(
            "- The caller's current goal is: \"{intent}\". Proceed on this goal without asking \
             the caller to repeat it."
        ));
    }
    if let Some(summary) = &inherited.task_summary {
        lines.push(format!("- Prior task summary: {summary}"));
    }
    Some(lines.join("\n"))
}

/// (c) Handoff-tools instruction block.
fn handoff_tools_block(handoff_tool_names: &[String]) -> Option<String> {
    if handoff_tool_names.is_empty() {
        return None;
    }
    let listed = handoff_tool_names
        .iter()
        .map(|n| format!("`{n}`"))
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!(
        "## Handoffs\n\
         You can transfer the caller to another specialist by calling one of: {listed}. \
         Only call a handoff tool when the caller's need clearly belongs to that specialist; \
         otherwise keep handling the conversation yourself."
    ))
}

/// (d) Textual rendering of the current workflow, for the model's benefit —
/// purely descriptive, the engine itself enforces transitions.
fn workflow_block(workflow: &Workflow, state: &WorkflowState) -> String {
    let mut lines = vec![
        "## Workflow".to_string(),
        format!("You are currently at step `{}`.", state.current_node_id),
    ];
    for node in &workflow.nodes {
        let marker = if node.id == state.current_node_id { "-> " } else { "   " };
        let label = node.label.as_deref().unwrap_or("");
        lines.push(format!("{marker}{} ({:?}) {label}", node.id, node.kind));
    }
    lines.join("\n")
}

/// Build the full system prompt in its load-bearing order.
pub fn system_prompt(
    inherited: &InheritedMemory,
    persona: &Persona,
    handoff_tool_names: &[String],
    workflow: &Workflow,
    state: &WorkflowState,
) -> String {
    let mut sections = Vec::new();
    if let Some(ctx) = context_block(inherited) {
        sections.push(ctx);
    }
    sections.push(persona.system_prompt.clone());
    if let Some(handoffs) = handoff_tools_block(handoff_tool_names) {
        sections.push(handoffs);
    }
    sections.push(workflow_block(workflow, state));
    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_workflow::{Edge, Node, NodeKind};

    fn persona() -> Persona {
        Persona {
            system_prompt: "You are the banking specialist.".into(),
            handoff_targets: vec!["routing".into()],
        }
    }

    fn workflow() -> Workflow {
        Workflow {
            id: "banking".into(),
            nodes: vec![
                Node { id: "begin".into(), kind: NodeKind::Start, label: None },
                Node { id: "end".into(), kind: NodeKind::End, label: None },
            ],
            edges: vec![Edge { from: "begin".into(), to: "end".into(), guard: None }],
        }
    }

    #[test]
    fn sections_appear_in_the_load_bearing_order() {
        let inherited = InheritedMemory {
            verified: true,
            user_intent: Some("check my balance".into()),
            ..Default::default()
        };
        let wf = workflow();
        let state = WorkflowState::new(&wf);
        let prompt = system_prompt(
            &inherited,
            &persona(),
            &["return_to_routing".to_string()],
            &wf,
            &state,
        );

        let ctx_pos = prompt.find("Known Session Context").unwrap();
        let persona_pos = prompt.find("banking specialist").unwrap();
        let handoff_pos = prompt.find("## Handoffs").unwrap();
        let workflow_pos = prompt.find("## Workflow").unwrap();
        assert!(ctx_pos < persona_pos);
        assert!(persona_pos < handoff_pos);
        assert!(handoff_pos < workflow_pos);
    }

    #[test]
    fn no_inherited_memory_omits_context_block() {
        let wf = workflow();
        let state = WorkflowState::new(&wf);
        let prompt = system_prompt(&InheritedMemory::default(), &persona(), &[], &wf, &state);
        assert!(!prompt.contains("Known Session Context"));
    }

    #[test]
    fn no_handoff_targets_omits_handoffs_block() {
        let wf = workflow();
        let state = WorkflowState::new(&wf);
        let prompt = system_prompt(&InheritedMemory::default(), &persona(), &[], &wf, &state);
        assert!(!prompt.contains("## Handoffs"));
    }

    #[test]
    fn verified_user_note_mentions_no_reverification() {
        let inherited = InheritedMemory { verified: true, ..Default::default() };
        let wf = workflow();
        let state = WorkflowState::new(&wf);
        let prompt = system_prompt(&inherited, &persona(), &[], &wf, &state);
        assert!(prompt.contains("Do not re-verify") || prompt.contains("Do not ask"));
    }

    #[test]
    fn workflow_block_marks_current_node() {
        let wf = workflow();
        let state = WorkflowState::new(&wf);
        let prompt = system_prompt(&InheritedMemory::default(), &persona(), &[], &wf, &state);
        assert!(prompt.contains("-> begin"));
    }
}
