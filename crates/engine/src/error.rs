// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for planning and execution

use crate::callbacks::CallbackRegistration;
use crate::plugins::PluginError;
use partcraft_adapters::packages::PackageError;
use partcraft_adapters::sources::SourceError;
use partcraft_core::document::DocumentError;
use partcraft_core::fileset::FilesetError;
use partcraft_core::part::PartError;
use partcraft_core::InternalError;
use partcraft_state::StateError;
use thiserror::Error;

/// Errors that can occur while executing an action.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("failed to run the build script for part {part_name:?}")]
    PluginBuild { part_name: String },
    #[error("{scriptlet_name:?} scriptlet exited with code {code}")]
    ScriptletRun { scriptlet_name: String, code: i32 },
    #[error("invalid control API call in part {part_name:?}: {message}")]
    InvalidControlApiCall { part_name: String, message: String },
    #[error(
        "parts {part_name:?} and {other_part_name:?} stage conflicting files: {conflict_files:?}"
    )]
    PartFilesConflict {
        part_name: String,
        other_part_name: String,
        conflict_files: Vec<String>,
    },
    #[error(transparent)]
    Part(#[from] PartError),
    #[error(transparent)]
    Plugin(#[from] PluginError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Package(#[from] PackageError),
    #[error(transparent)]
    Fileset(#[from] FilesetError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Internal(#[from] InternalError),
    #[error("i/o error while {action}: {source}")]
    Io {
        action: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExecutionError {
    pub(crate) fn io(action: impl Into<String>) -> impl FnOnce(std::io::Error) -> Self {
        let action = action.into();
        move |source| Self::Io { action, source }
    }
}

/// Errors surfaced by the lifecycle manager.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Part(#[from] PartError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Plugin(#[from] PluginError),
    #[error(transparent)]
    Package(#[from] PackageError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Callback(#[from] CallbackRegistration),
    #[error(transparent)]
    Internal(#[from] InternalError),
}
