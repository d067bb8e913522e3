// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("workflow file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("workflow file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("workflow {workflow_id:?} must declare exactly one start node, found {found}")]
    StartNodeCount { workflow_id: String, found: usize },

    #[error("workflow {workflow_id:?}: edge references undeclared node {node_id:?}")]
    DanglingEdge { workflow_id: String, node_id: String },

    #[error("workflow {workflow_id:?}: node id {node_id:?} declared more than once")]
    DuplicateNode { workflow_id: String, node_id: String },

    #[error("no transition from {from:?} to {to:?} is valid in the current state")]
    InvalidTransition { from: String, to: String },
}
