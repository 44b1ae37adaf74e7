// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed per-step state records.

use partcraft_core::{Properties, Step};
use std::collections::BTreeSet;

/// Properties the pull step cares about.
const PULL_PROPERTIES: &[&str] = &[
    "override-pull",
    "plugin",
    "source",
    "source-branch",
    "source-checksum",
    "source-commit",
    "source-depth",
    "source-submodules",
    "source-tag",
    "source-type",
    "stage-packages",
];

/// Properties the build step cares about; plugin-prefixed keys are added
/// dynamically.
const BUILD_PROPERTIES: &[&str] = &[
    "after",
    "build-attributes",
    "build-environment",
    "build-packages",
    "build-snaps",
    "organize",
    "override-build",
    "plugin",
];

const STAGE_PROPERTIES: &[&str] = &["stage", "override-stage"];
const PRIME_PROPERTIES: &[&str] = &["prime", "override-prime"];

/// The recorded inputs and outputs of one step of one part.
///
/// Each variant declares, through [`PartState::property_is_of_interest`]
/// and [`PartState::option_is_of_interest`], which slice of the inputs it
/// compares when deciding whether the step went dirty.
#[derive(Debug, Clone, PartialEq)]
pub enum PartState {
    Pull {
        part_properties: Properties,
        project_options: Properties,
        /// Resolved stage packages (`name=version`).
        assets: Properties,
    },
    Build {
        part_properties: Properties,
        project_options: Properties,
        /// Resolved build packages and snaps.
        assets: Properties,
    },
    Stage {
        part_properties: Properties,
        project_options: Properties,
        files: BTreeSet<String>,
        directories: BTreeSet<String>,
    },
    Prime {
        part_properties: Properties,
        project_options: Properties,
        files: BTreeSet<String>,
        directories: BTreeSet<String>,
    },
}

impl PartState {
    pub fn step(&self) -> Step {
        match self {
            PartState::Pull { .. } => Step::Pull,
            PartState::Build { .. } => Step::Build,
            PartState::Stage { .. } => Step::Stage,
            PartState::Prime { .. } => Step::Prime,
        }
    }

    pub fn part_properties(&self) -> &Properties {
        match self {
            PartState::Pull {
                part_properties, ..
            }
            | PartState::Build {
                part_properties, ..
            }
            | PartState::Stage {
                part_properties, ..
            }
            | PartState::Prime {
                part_properties, ..
            } => part_properties,
        }
    }

    pub fn project_options(&self) -> &Properties {
        match self {
            PartState::Pull {
                project_options, ..
            }
            | PartState::Build {
                project_options, ..
            }
            | PartState::Stage {
                project_options, ..
            }
            | PartState::Prime {
                project_options, ..
            } => project_options,
        }
    }

    pub fn assets(&self) -> Option<&Properties> {
        match self {
            PartState::Pull { assets, .. } | PartState::Build { assets, .. } => Some(assets),
            _ => None,
        }
    }

    /// Files recorded by a stage or prime state.
    pub fn files(&self) -> Option<&BTreeSet<String>> {
        match self {
            PartState::Stage { files, .. } | PartState::Prime { files, .. } => Some(files),
            _ => None,
        }
    }

    pub fn directories(&self) -> Option<&BTreeSet<String>> {
        match self {
            PartState::Stage { directories, .. } | PartState::Prime { directories, .. } => {
                Some(directories)
            }
            _ => None,
        }
    }

    fn property_is_of_interest(&self, key: &str, plugin_prefix: Option<&str>) -> bool {
        match self {
            PartState::Pull { .. } => PULL_PROPERTIES.contains(&key),
            PartState::Build { .. } => {
                BUILD_PROPERTIES.contains(&key)
                    || plugin_prefix.is_some_and(|prefix| key.starts_with(prefix))
            }
            PartState::Stage { .. } => STAGE_PROPERTIES.contains(&key),
            PartState::Prime { .. } => PRIME_PROPERTIES.contains(&key),
        }
    }

    fn option_is_of_interest(&self, key: &str) -> bool {
        match self {
            PartState::Pull { .. } | PartState::Build { .. } => key == "target_arch",
            PartState::Stage { .. } | PartState::Prime { .. } => false,
        }
    }

    /// The subset of `full_properties` this step compares for dirtiness.
    pub fn properties_of_interest(&self, full_properties: &Properties) -> Properties {
        let prefix = plugin_prefix(full_properties);
        full_properties
            .iter()
            .filter(|(key, _)| self.property_is_of_interest(key, prefix.as_deref()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// The subset of `full_options` this step compares for dirtiness.
    pub fn project_options_of_interest(&self, full_options: &Properties) -> Properties {
        full_options
            .iter()
            .filter(|(key, _)| self.option_is_of_interest(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Names of properties of interest whose stored value disagrees with
    /// the current one.
    pub fn diff_properties_of_interest(&self, current: &Properties) -> BTreeSet<String> {
        let stored = self.part_properties();
        let prefix = plugin_prefix(current).or_else(|| plugin_prefix(stored));

        let mut dirty = BTreeSet::new();
        for key in stored.keys().chain(current.keys()) {
            if self.property_is_of_interest(key, prefix.as_deref())
                && stored.get(key) != current.get(key)
            {
                dirty.insert(key.clone());
            }
        }
        dirty
    }

    /// Names of project options of interest whose stored value disagrees
    /// with the current one.
    pub fn diff_project_options_of_interest(&self, current: &Properties) -> BTreeSet<String> {
        let stored = self.project_options();

        let mut dirty = BTreeSet::new();
        for key in stored.keys().chain(current.keys()) {
            if self.option_is_of_interest(key) && stored.get(key) != current.get(key) {
                dirty.insert(key.clone());
            }
        }
        dirty
    }
}

fn plugin_prefix(properties: &Properties) -> Option<String> {
    match properties.get("plugin") {
        Some(serde_yaml::Value::String(plugin)) => Some(format!("{plugin}-")),
        _ => None,
    }
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;
