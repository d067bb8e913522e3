// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Loads the static tool catalog an agent advertises to the S2S provider
//! (name, description, JSON Schema parameters), filtered by the process's
//! declared `tool_scopes`. Handoff tool schemas are synthesized
//! separately by `AgentCore` itself and are never part of this file.

use std::path::Path;

use serde::Deserialize;
use switchboard_s2s::ToolSchema;

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    name: String,
    description: String,
    #[serde(default)]
    parameters: serde_json::Value,
}

/// Reads a YAML list of tool entries and keeps only those named in
/// `tool_scopes` plus every entry named in `idv_tool_names` (identity
/// verification tools are dispatched by name, not by scope, but still need
/// a schema in the catalog). An empty `tool_scopes` keeps everything.
pub fn load_catalog(
    path: &Path,
    tool_scopes: &[String],
    idv_tool_names: &[String],
) -> anyhow::Result<Vec<ToolSchema>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("reading tool catalog {}: {e}", path.display()))?;
    let entries: Vec<CatalogEntry> = serde_yaml::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("parsing tool catalog {}: {e}", path.display()))?;

    let allow_all = tool_scopes.is_empty();
    Ok(entries
        .into_iter()
        .filter(|e| allow_all || tool_scopes.iter().any(|s| s == &e.name) || idv_tool_names.iter().any(|s| s == &e.name))
        .map(|e| ToolSchema {
            name: e.name,
            description: e.description,
            parameters: e.parameters,
        })
        .collect())
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
    fn filters_to_declared_scopes() {
        let file = write_yaml(
            r#"
- name: get_account_balance
  description: Look up an account balance.
  parameters: {type: object, properties: {account: {type: string}}}
- name: send_sms
  description: Send an SMS.
  parameters: {type: object, properties: {}}
"#,
        );
        let catalog = load_catalog(file.path(), &["get_account_balance".into()], &[]).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].name, "get_account_balance");
    }

    #[test]
    fn idv_tools_are_kept_even_outside_tool_scopes() {
        let file = write_yaml(
            r#"
- name: perform_idv_check
  description: Verify a caller's identity.
  parameters: {type: object, properties: {}}
- name: get_account_balance
  description: Look up an account balance.
  parameters: {type: object, properties: {}}
"#,
        );
        let catalog = load_catalog(
            file.path(),
            &["get_account_balance".into()],
            &["perform_idv_check".into()],
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn empty_scopes_keep_everything() {
        let file = write_yaml(
            r#"
- name: a
  description: d
  parameters: {}
- name: b
  description: d
  parameters: {}
"#,
        );
        let catalog = load_catalog(file.path(), &[], &[]).unwrap();
        assert_eq!(catalog.len(), 2);
    }
}
