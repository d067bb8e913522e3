// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RuntimeError;

/// An agent's persona, loaded once at process startup from `persona_file`
///.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    /// Free-text instructions that become the "(b) persona prompt" section
    /// of the system prompt.
    pub system_prompt: String,
    /// Agent ids this persona may transfer to (`transfer_to_<id>` tools).
    #[serde(default)]
    pub handoff_targets: Vec<String>,
}

pub fn load_persona(path: &Path) -> Result<Persona, RuntimeError> {
    let text = std::fs::read_to_string(path).map_err(|source| RuntimeError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| RuntimeError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_a_persona_with_handoff_targets() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "system_prompt: \"You are the banking specialist.\"\nhandoff_targets: [routing]"
        )
        .unwrap();
        let persona = load_persona(f.path()).unwrap();
        assert_eq!(persona.system_prompt, "You are the banking specialist.");
        assert_eq!(persona.handoff_targets, vec!["routing".to_string()]);
    }

    #[test]
    fn handoff_targets_default_to_empty() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "system_prompt: \"Routing agent.\"").unwrap();
        let persona = load_persona(f.path()).unwrap();
        assert!(persona.handoff_targets.is_empty());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = load_persona(Path::new("/tmp/does-not-exist-switchboard.yaml"));
        assert!(matches!(result, Err(RuntimeError::Read { .. })));
    }
}
