// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Part definitions and dependency ordering.

use crate::project::ProjectDirs;
use crate::Properties;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from part lookup and ordering.
#[derive(Debug, Error)]
pub enum PartError {
    #[error("a part named {0:?} is not defined in the parts list")]
    InvalidPartName(String),
    #[error("parts {0:?} have a circular 'after' dependency")]
    CycleDetected(Vec<String>),
}

/// The specification of a part as written in the parts document.
///
/// Field names map to the document's kebab-case keys. Keys prefixed with
/// the plugin name (`make-parameters`, ...) are collected into
/// `plugin_properties` and consumed by the plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PartSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_depth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_submodules: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stage_packages: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_packages: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_snaps: Vec<String>,

    /// Ordered `KEY: value` entries appended to the step environment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_environment: Vec<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_attributes: Vec<String>,

    /// Renames applied inside the install directory after build.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub organize: IndexMap<String, String>,

    #[serde(default = "fileset_default")]
    pub stage: Vec<String>,
    #[serde(default = "fileset_default")]
    pub prime: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_pull: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_build: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_prime: Option<String>,

    /// Plugin-prefixed properties, e.g. `make-parameters`.
    #[serde(flatten)]
    pub plugin_properties: IndexMap<String, serde_yaml::Value>,
}

fn fileset_default() -> Vec<String> {
    vec!["*".to_string()]
}

impl PartSpec {
    /// Flatten the spec back into the document's property map.
    ///
    /// The result is what step states store as `part_properties`; keeping
    /// it in document form makes the dirty diffs line up with what the
    /// user wrote.
    pub fn marshal(&self) -> Properties {
        let mut properties = BTreeMap::new();
        if let Ok(serde_yaml::Value::Mapping(mapping)) = serde_yaml::to_value(self) {
            for (key, value) in mapping {
                if let serde_yaml::Value::String(key) = key {
                    properties.insert(key, value);
                }
            }
        }
        properties
    }

    /// The scriptlet overriding the given step, if any.
    pub fn override_for(&self, step: crate::step::Step) -> Option<&str> {
        use crate::step::Step;
        match step {
            Step::Pull => self.override_pull.as_deref(),
            Step::Build => self.override_build.as_deref(),
            Step::Stage => self.override_stage.as_deref(),
            Step::Prime => self.override_prime.as_deref(),
        }
    }
}

/// A named part and its work directories.
#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub spec: PartSpec,
    dirs: ProjectDirs,
}

impl Part {
    pub fn new(name: impl Into<String>, spec: PartSpec, dirs: &ProjectDirs) -> Self {
        Self {
            name: name.into(),
            spec,
            dirs: dirs.clone(),
        }
    }

    /// The plugin processing this part. Defaults to the part name when the
    /// spec doesn't name one.
    pub fn plugin_name(&self) -> &str {
        self.spec.plugin.as_deref().unwrap_or(&self.name)
    }

    /// Direct dependencies declared with `after`.
    pub fn dependencies(&self) -> &[String] {
        &self.spec.after
    }

    pub fn part_base_dir(&self) -> PathBuf {
        self.dirs.parts_dir().join(&self.name)
    }

    /// Where the pull step puts the part's source tree.
    pub fn part_src_dir(&self) -> PathBuf {
        self.part_base_dir().join("src")
    }

    /// Working directory of the build step.
    pub fn part_build_dir(&self) -> PathBuf {
        self.part_base_dir().join("build")
    }

    /// Per-part output of the build step; source of truth for staging.
    pub fn part_install_dir(&self) -> PathBuf {
        self.part_base_dir().join("install")
    }

    /// Where per-step state records are persisted.
    pub fn part_state_dir(&self) -> PathBuf {
        self.part_base_dir().join("state")
    }

    /// Scratch directory for synthesized step scripts.
    pub fn part_run_dir(&self) -> PathBuf {
        self.part_base_dir().join("run")
    }

    /// Download cache for the part's stage packages.
    pub fn part_packages_dir(&self) -> PathBuf {
        self.part_base_dir().join("stage_packages")
    }

    pub fn stage_dir(&self) -> PathBuf {
        self.dirs.stage_dir()
    }

    pub fn prime_dir(&self) -> PathBuf {
        self.dirs.prime_dir()
    }

    /// The working directory a step's commands run in.
    pub fn step_work_dir(&self, step: crate::step::Step) -> PathBuf {
        use crate::step::Step;
        match step {
            Step::Pull => self.part_src_dir(),
            Step::Build => self.part_build_dir(),
            Step::Stage => self.stage_dir(),
            Step::Prime => self.prime_dir(),
        }
    }
}

/// Find a part by name.
pub fn part_by_name<'a>(name: &str, parts: &'a [Part]) -> Result<&'a Part, PartError> {
    parts
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| PartError::InvalidPartName(name.to_string()))
}

/// Select the named parts, or all parts if no names are given.
///
/// The returned list keeps the order of `parts`.
pub fn part_list_by_name<'a>(
    names: &[String],
    parts: &'a [Part],
) -> Result<Vec<&'a Part>, PartError> {
    if names.is_empty() {
        return Ok(parts.iter().collect());
    }

    for name in names {
        part_by_name(name, parts)?;
    }

    Ok(parts
        .iter()
        .filter(|p| names.iter().any(|n| *n == p.name))
        .collect())
}

/// Topologically sort parts by their `after` dependencies.
///
/// Ties are broken by part name so the order is stable across runs.
pub fn sort_parts(mut parts: Vec<Part>) -> Result<Vec<Part>, PartError> {
    parts.sort_by(|a, b| a.name.cmp(&b.name));

    let mut sorted = Vec::with_capacity(parts.len());
    let mut remaining: VecDeque<Part> = parts.into();

    'outer: while !remaining.is_empty() {
        for index in 0..remaining.len() {
            let candidate = &remaining[index];
            let blocked = remaining
                .iter()
                .any(|other| candidate.dependencies().contains(&other.name));
            if !blocked {
                if let Some(part) = remaining.remove(index) {
                    sorted.push(part);
                }
                continue 'outer;
            }
        }
        // Every remaining part waits on another remaining part.
        let names = remaining.iter().map(|p| p.name.clone()).collect();
        return Err(PartError::CycleDetected(names));
    }

    Ok(sorted)
}

/// The set of parts a part depends on, directly or (optionally)
/// transitively. The result is ordered by part name.
pub fn part_dependencies<'a>(
    name: &str,
    parts: &'a [Part],
    recursive: bool,
) -> Result<Vec<&'a Part>, PartError> {
    let part = part_by_name(name, parts)?;

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut queue: VecDeque<&Part> = VecDeque::new();
    queue.push_back(part);

    while let Some(current) = queue.pop_front() {
        for dep_name in current.dependencies() {
            let dep = part_by_name(dep_name, parts)?;
            if seen.insert(&dep.name) && recursive {
                queue.push_back(dep);
            }
        }
    }

    seen.into_iter()
        .map(|dep_name| part_by_name(dep_name, parts))
        .collect()
}

#[cfg(test)]
#[path = "part_tests.rs"]
mod tests;
