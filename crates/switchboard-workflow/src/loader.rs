// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Loads a `Workflow` from the agent's `WORKFLOW_FILE` (YAML) and validates
//! it fail-fast at startup: exactly one `start` node, no dangling edges, no
//! duplicate node ids. A workflow that fails validation must never reach a
//! running session.

use std::collections::HashSet;
use std::path::Path;

use crate::error::WorkflowError;
use crate::types::{NodeKind, Workflow};

pub fn load_workflow(path: impl AsRef<Path>) -> Result<Workflow, WorkflowError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| WorkflowError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let workflow: Workflow = serde_yaml::from_str(&raw).map_err(|source| WorkflowError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    validate(&workflow)?;
    Ok(workflow)
}

fn validate(workflow: &Workflow) -> Result<(), WorkflowError> {
    let mut seen = HashSet::new();
    for node in &workflow.nodes {
        if !seen.insert(&node.id) {
            return Err(WorkflowError::DuplicateNode {
                workflow_id: workflow.id.clone(),
                node_id: node.id.clone(),
            });
        }
    }

    let start_count = workflow
        .nodes
        .iter()
        .filter(|n| n.kind == NodeKind::Start)
        .count();
    if start_count != 1 {
        return Err(WorkflowError::StartNodeCount {
            workflow_id: workflow.id.clone(),
            found: start_count,
        });
    }

    for edge in &workflow.edges {
        if workflow.node(&edge.from).is_none() {
            return Err(WorkflowError::DanglingEdge {
                workflow_id: workflow.id.clone(),
                node_id: edge.from.clone(),
            });
        }
        if workflow.node(&edge.to).is_none() {
            return Err(WorkflowError::DanglingEdge {
                workflow_id: workflow.id.clone(),
                node_id: edge.to.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_a_valid_workflow() {
        let file = write_yaml(
            r#"
id: banking
nodes:
  - {id: begin, kind: start}
  - {id: done, kind: end}
edges:
  - {from: begin, to: done}
"#,
        );
        let workflow = load_workflow(file.path()).unwrap();
        assert_eq!(workflow.id, "banking");
        assert_eq!(workflow.nodes.len(), 2);
    }

    #[test]
    fn rejects_zero_start_nodes() {
        let file = write_yaml(
            r#"
id: banking
nodes:
  - {id: done, kind: end}
edges: []
"#,
        );
        assert!(matches!(
            load_workflow(file.path()),
            Err(WorkflowError::StartNodeCount { found: 0, .. })
        ));
    }

    #[test]
    fn rejects_two_start_nodes() {
        let file = write_yaml(
            r#"
id: banking
nodes:
  - {id: a, kind: start}
  - {id: b, kind: start}
edges: []
"#,
        );
        assert!(matches!(
            load_workflow(file.path()),
            Err(WorkflowError::StartNodeCount { found: 2, .. })
        ));
    }

    #[test]
    fn rejects_dangling_edge() {
        let file = write_yaml(
            r#"
id: banking
nodes:
  - {id: begin, kind: start}
edges:
  - {from: begin, to: nowhere}
"#,
        );
        assert!(matches!(
            load_workflow(file.path()),
            Err(WorkflowError::DanglingEdge { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_node_ids() {
        let file = write_yaml(
            r#"
id: banking
nodes:
  - {id: begin, kind: start}
  - {id: begin, kind: end}
edges: []
"#,
        );
        assert!(matches!(
            load_workflow(file.path()),
            Err(WorkflowError::DuplicateNode { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        assert!(matches!(
            load_workflow("/nonexistent/path.yaml"),
            Err(WorkflowError::Read { .. })
        ));
    }
}
