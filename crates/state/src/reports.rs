// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dirty and outdated reports.

use partcraft_core::Step;

/// A dependency whose prerequisite step changed under a dependent part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub part_name: String,
    pub step: Step,
}

/// Why a step must be cleaned and re-run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyReport {
    pub dirty_properties: Vec<String>,
    pub dirty_project_options: Vec<String>,
    pub changed_dependencies: Vec<Dependency>,
}

impl DirtyReport {
    pub fn is_empty(&self) -> bool {
        self.dirty_properties.is_empty()
            && self.dirty_project_options.is_empty()
            && self.changed_dependencies.is_empty()
    }

    /// A short reason line for the action list.
    pub fn summary(&self) -> String {
        if !self.dirty_properties.is_empty() {
            return changed_summary(&self.dirty_properties, "property", "properties");
        }
        if !self.dirty_project_options.is_empty() {
            return changed_summary(&self.dirty_project_options, "option", "options");
        }
        match self.changed_dependencies.as_slice() {
            [only] => format!("{:?} dependency changed", only.part_name),
            _ => "dependencies changed".to_string(),
        }
    }
}

fn changed_summary(names: &[String], singular: &str, plural: &str) -> String {
    match names {
        [only] => format!("{only:?} {singular} changed"),
        _ => format!("{plural} changed"),
    }
}

/// Why a step needs a non-destructive refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutdatedReport {
    /// The source handler reported an upstream change (pull only).
    SourceUpdated,
    /// An earlier step of the same part ran more recently.
    PreviousStepModified(Step),
}

impl OutdatedReport {
    pub fn summary(&self) -> String {
        match self {
            OutdatedReport::SourceUpdated => "source changed".to_string(),
            OutdatedReport::PreviousStepModified(step) => format!("{:?} step changed", step.name()),
        }
    }
}

#[cfg(test)]
#[path = "reports_tests.rs"]
mod tests;
