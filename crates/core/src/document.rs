// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parts document loading and validation.
//!
//! The input is a YAML mapping of the form `{ parts: { <name>: <spec> } }`.
//! Declaration order is preserved so error messages and default planning
//! order follow the document.

use crate::part::{Part, PartSpec};
use crate::project::ProjectDirs;
use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("parts definition is malformed: {0}")]
    SchemaValidation(String),
    #[error("part {part:?} has invalid name: {reason}")]
    InvalidPartName { part: String, reason: String },
    #[error("part {part:?} is 'after' unknown part {dependency:?}")]
    UnknownDependency { part: String, dependency: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartsDocument {
    parts: IndexMap<String, PartSpec>,
}

/// Parse and validate a parts document, producing the part list in
/// declaration order.
pub fn parse_parts_document(
    text: &str,
    dirs: &ProjectDirs,
) -> Result<Vec<Part>, DocumentError> {
    let document: PartsDocument = serde_yaml::from_str(text)
        .map_err(|err| DocumentError::SchemaValidation(err.to_string()))?;

    if document.parts.is_empty() {
        return Err(DocumentError::SchemaValidation(
            "at least one part must be defined".to_string(),
        ));
    }

    let mut parts = Vec::with_capacity(document.parts.len());
    for (name, spec) in document.parts {
        validate_part_name(&name)?;
        let part = Part::new(name, spec, dirs);
        validate_plugin_properties(&part)?;
        parts.push(part);
    }

    for part in &parts {
        for dependency in part.dependencies() {
            if !parts.iter().any(|p| &p.name == dependency) {
                return Err(DocumentError::UnknownDependency {
                    part: part.name.clone(),
                    dependency: dependency.clone(),
                });
            }
        }
    }

    tracing::debug!(parts = parts.len(), "parsed parts document");
    Ok(parts)
}

fn validate_part_name(name: &str) -> Result<(), DocumentError> {
    let valid = !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(DocumentError::InvalidPartName {
            part: name.to_string(),
            reason: "names use lowercase letters, digits and dashes".to_string(),
        })
    }
}

/// Keys not recognized by the schema must belong to the part's plugin.
fn validate_plugin_properties(part: &Part) -> Result<(), DocumentError> {
    let prefix = format!("{}-", part.plugin_name());
    for key in part.spec.plugin_properties.keys() {
        if !key.starts_with(&prefix) {
            return Err(DocumentError::SchemaValidation(format!(
                "unknown property {key:?} in part {:?}",
                part.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
