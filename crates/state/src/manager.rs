// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The state manager: answers the planner's questions about step state.

use crate::persist;
use crate::records::PartState;
use crate::reports::{Dependency, DirtyReport, OutdatedReport};
use crate::wrapper::{StateOrdering, StateStore, StateWrapper};
use partcraft_adapters::sources::{self, SourceHandler, UpdateCheck};
use partcraft_core::{part_dependencies, InternalError, Part, ProjectInfo, Step};
use std::collections::HashMap;

/// Keeps track of parts execution state.
///
/// Persisted states are loaded once at construction; ephemeral states
/// replace them as planning and execution progress. The manager never
/// writes to disk — persisting state after a successful step is the
/// executor's job.
pub struct StateManager {
    project_info: ProjectInfo,
    parts: Vec<Part>,
    store: StateStore,
    source_handlers: HashMap<String, Option<Box<dyn SourceHandler>>>,
}

impl StateManager {
    pub fn new(project_info: &ProjectInfo, parts: &[Part]) -> Result<Self, persist::StateError> {
        let mut store = StateStore::new();
        for part in parts {
            for step in Step::ALL {
                let path = persist::state_file_path(part, step);
                if let Some((state, timestamp)) = persist::read_state(step, &path)? {
                    store.set(&part.name, step, StateWrapper::persisted(state, timestamp));
                }
            }
        }

        Ok(Self {
            project_info: project_info.clone(),
            parts: parts.to_vec(),
            store,
            source_handlers: HashMap::new(),
        })
    }

    /// Whether the given step of the given part has state, i.e. has run
    /// (or was planned to run) at some point.
    pub fn has_step_run(&self, part: &Part, step: Step) -> bool {
        self.store.contains(&part.name, step)
    }

    /// Set the ephemeral state of the given part and step.
    pub fn set_state(&mut self, part: &Part, step: Step, state: PartState) {
        let wrapper = self.store.new_ephemeral(state, false);
        self.store.set(&part.name, step, wrapper);
    }

    /// Rewrap the state of the given part and step with a fresh serial.
    pub fn update_state_timestamp(&mut self, part: &Part, step: Step) {
        self.store.update_serial(&part.name, step);
    }

    /// Mark the given part and step as refreshed after an outdated report.
    pub fn mark_step_updated(&mut self, part: &Part, step: Step) {
        self.store.set_updated(&part.name, step);
    }

    /// Remove the in-memory state for this and all later steps.
    pub fn clean_part(&mut self, part: &Part, step: Step) {
        self.store.remove(&part.name, step);
        for later in step.next_steps() {
            self.store.remove(&part.name, *later);
        }
    }

    /// Whether a step should run: it never ran, it is dirty, it is
    /// outdated, or the same holds for an earlier step of the part.
    pub fn should_step_run(&mut self, part: &Part, step: Step) -> Result<bool, InternalError> {
        if !self.has_step_run(part, step)
            || self.outdated_report(part, step).is_some()
            || self.dirty_report(part, step)?.is_some()
        {
            return Ok(true);
        }

        match step.previous_steps().last() {
            Some(previous) => self.should_step_run(part, *previous),
            None => Ok(false),
        }
    }

    /// Why the given step must be cleaned and re-run, if it must.
    ///
    /// A step is dirty when the properties or project options it cares
    /// about changed since it ran, or when a transitive dependency became
    /// newer at the prerequisite step (or should run again itself).
    pub fn dirty_report(
        &mut self,
        part: &Part,
        step: Step,
    ) -> Result<Option<DirtyReport>, InternalError> {
        if let Some(report) = self.dirty_report_for_part(part, step) {
            return Ok(Some(report));
        }

        let Some(prerequisite_step) = step.dependency_prerequisite_step() else {
            return Ok(None);
        };

        let dependencies: Vec<Part> = part_dependencies(&part.name, &self.parts, true)
            .map_err(|err| InternalError::new(err.to_string()))?
            .into_iter()
            .cloned()
            .collect();
        if dependencies.is_empty() {
            return Ok(None);
        }

        let this_ordering = self
            .store
            .get(&part.name, step)
            .map(StateWrapper::ordering)
            .ok_or_else(|| {
                InternalError::new(format!(
                    "{}:{step} should already have been run",
                    part.name
                ))
            })?;

        let mut changed_dependencies = Vec::new();
        for dependency in dependencies {
            let dependency_changed = match self.store.get(&dependency.name, prerequisite_step) {
                Some(wrapper) => wrapper.ordering().is_newer_than(this_ordering),
                None => true,
            };

            if dependency_changed || self.should_step_run(&dependency, prerequisite_step)? {
                changed_dependencies.push(Dependency {
                    part_name: dependency.name.clone(),
                    step: prerequisite_step,
                });
            }
        }

        if changed_dependencies.is_empty() {
            Ok(None)
        } else {
            Ok(Some(DirtyReport {
                changed_dependencies,
                ..DirtyReport::default()
            }))
        }
    }

    /// Why the given step needs a non-destructive refresh, if it does.
    ///
    /// Pull is outdated when the source handler reports an upstream
    /// change; later steps are outdated when an earlier step of the part
    /// ran more recently. A step already marked updated reports nothing.
    pub fn outdated_report(&mut self, part: &Part, step: Step) -> Option<OutdatedReport> {
        if self.store.was_updated(&part.name, step) {
            return None;
        }

        let this_ordering = self.store.get(&part.name, step)?.ordering();

        if step == Step::Pull {
            return self.check_source_updated(part);
        }

        for previous in step.previous_steps().iter().rev() {
            if let Some(wrapper) = self.store.get(&part.name, *previous) {
                if wrapper.ordering().is_newer_than(this_ordering) {
                    return Some(OutdatedReport::PreviousStepModified(*previous));
                }
            }
        }

        None
    }

    fn check_source_updated(&mut self, part: &Part) -> Option<OutdatedReport> {
        let state_file = persist::state_file_path(part, Step::Pull);

        if !self.source_handlers.contains_key(&part.name) {
            let application_name = self.project_info.application_name();
            let handler = match sources::source_handler_for_part(part, application_name) {
                Ok(handler) => handler,
                Err(err) => {
                    tracing::warn!(part = %part.name, error = %err, "cannot resolve source handler");
                    None
                }
            };
            self.source_handlers.insert(part.name.clone(), handler);
        }

        let handler = self.source_handlers.get(&part.name)?.as_deref()?;
        match handler.check(&state_file) {
            // Not all sources support checking for updates.
            Ok(UpdateCheck::Unsupported) | Ok(UpdateCheck::UpToDate) => None,
            Ok(UpdateCheck::Updated) => Some(OutdatedReport::SourceUpdated),
            Err(err) => {
                tracing::warn!(part = %part.name, error = %err, "source update check failed");
                None
            }
        }
    }

    fn dirty_report_for_part(&self, part: &Part, step: Step) -> Option<DirtyReport> {
        let wrapper = self.store.get(&part.name, step)?;
        let state = wrapper.state();

        let current_properties = part.spec.marshal();
        let properties = state.diff_properties_of_interest(&current_properties);
        let options =
            state.diff_project_options_of_interest(&self.project_info.project_options());

        if properties.is_empty() && options.is_empty() {
            return None;
        }

        Some(DirtyReport {
            dirty_properties: properties.into_iter().collect(),
            dirty_project_options: options.into_iter().collect(),
            changed_dependencies: Vec::new(),
        })
    }

    /// The ordering metadata stored for a part and step, if any.
    pub fn state_ordering(&self, part: &Part, step: Step) -> Option<StateOrdering> {
        self.store.get(&part.name, step).map(StateWrapper::ordering)
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
