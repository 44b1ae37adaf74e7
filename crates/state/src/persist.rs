// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State record persistence.
//!
//! Each step of each part stores one YAML document at
//! `<work>/parts/<part>/state/<step>`. Maps are key-sorted and the
//! document carries a version tag, so the files are deterministic and
//! diffable across runs.

use crate::records::PartState;
use chrono::{DateTime, Utc};
use partcraft_core::{Part, Properties, Step};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Format version embedded in every state file.
pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("cannot access state file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("state file {path:?} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("state file {path:?} has unsupported version {version}")]
    UnsupportedVersion { path: PathBuf, version: u32 },
}

/// On-disk shape shared by all step states.
#[derive(Debug, Serialize, Deserialize)]
struct StateDocument {
    version: u32,
    part_properties: Properties,
    project_options: Properties,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    assets: Properties,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    files: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    directories: BTreeSet<String>,
}

/// Path of the state file for a part and step.
pub fn state_file_path(part: &Part, step: Step) -> PathBuf {
    part.part_state_dir().join(step.name())
}

/// Persist a state record, atomically replacing any previous one.
pub fn write_state(state: &PartState, path: &Path) -> Result<(), StateError> {
    let io_error = |source| StateError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }

    let document = StateDocument {
        version: STATE_VERSION,
        part_properties: state.part_properties().clone(),
        project_options: state.project_options().clone(),
        assets: state.assets().cloned().unwrap_or_default(),
        files: state.files().cloned().unwrap_or_default(),
        directories: state.directories().cloned().unwrap_or_default(),
    };
    let text = serde_yaml::to_string(&document).map_err(|source| StateError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;

    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, text).map_err(io_error)?;
    std::fs::rename(&temp_path, path).map_err(io_error)?;
    Ok(())
}

/// Load the state record for `step` if one is persisted at `path`.
///
/// Returns the state together with the file's modification time, which
/// becomes the wrapper's ordering timestamp.
pub fn read_state(
    step: Step,
    path: &Path,
) -> Result<Option<(PartState, DateTime<Utc>)>, StateError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StateError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let document: StateDocument =
        serde_yaml::from_str(&text).map_err(|source| StateError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
    if document.version != STATE_VERSION {
        return Err(StateError::UnsupportedVersion {
            path: path.to_path_buf(),
            version: document.version,
        });
    }

    let metadata = std::fs::metadata(path).map_err(|source| StateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let modified = metadata.modified().map_err(|source| StateError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let state = match step {
        Step::Pull => PartState::Pull {
            part_properties: document.part_properties,
            project_options: document.project_options,
            assets: document.assets,
        },
        Step::Build => PartState::Build {
            part_properties: document.part_properties,
            project_options: document.project_options,
            assets: document.assets,
        },
        Step::Stage => PartState::Stage {
            part_properties: document.part_properties,
            project_options: document.project_options,
            files: document.files,
            directories: document.directories,
        },
        Step::Prime => PartState::Prime {
            part_properties: document.part_properties,
            project_options: document.project_options,
            files: document.files,
            directories: document.directories,
        },
    };

    Ok(Some((state, DateTime::<Utc>::from(modified))))
}

/// Drop a persisted state record, ignoring records that never existed.
pub fn remove_state(path: &Path) -> Result<(), StateError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StateError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
