// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! partcraft-core: domain model for the parts lifecycle engine

pub mod action;
pub mod document;
pub mod error;
pub mod fileset;
pub mod part;
pub mod project;
pub mod step;

pub use action::{Action, ActionType};
pub use document::{parse_parts_document, DocumentError};
pub use error::InternalError;
pub use fileset::{migratable_filesets, Fileset, FilesetError};
pub use part::{
    part_by_name, part_dependencies, part_list_by_name, sort_parts, Part, PartError, PartSpec,
};
pub use project::{PartInfo, ProjectDirs, ProjectInfo, StepInfo};
pub use step::Step;

/// Property map as stored in part specifications and step states.
///
/// Keys are the document's kebab-case property names. A `BTreeMap` keeps
/// serialization deterministic.
pub type Properties = std::collections::BTreeMap<String, serde_yaml::Value>;
