// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The sequencer: turn a target step and part selection into actions.

use crate::error::LifecycleError;
use crate::plugins;
use partcraft_core::{
    part_dependencies, part_list_by_name, sort_parts, Action, ActionType, Part, PartInfo,
    ProjectInfo, Properties, Step,
};
use partcraft_state::{PartState, StateManager};
use std::collections::BTreeSet;

/// Obtain a list of actions from the parts specification.
pub struct Sequencer {
    part_list: Vec<Part>,
    project_info: ProjectInfo,
    state: StateManager,
    actions: Vec<Action>,
}

impl Sequencer {
    /// Create a sequencer over a topologically sorted part list.
    pub fn new(parts: Vec<Part>, project_info: ProjectInfo) -> Result<Self, LifecycleError> {
        let part_list = sort_parts(parts)?;
        let state = StateManager::new(&project_info, &part_list)?;
        Ok(Self {
            part_list,
            project_info,
            state,
            actions: Vec::new(),
        })
    }

    /// The sorted part list this sequencer plans over.
    pub fn part_list(&self) -> &[Part] {
        &self.part_list
    }

    /// Determine the list of actions to execute for each selected part to
    /// reach the target step.
    pub fn plan(
        &mut self,
        target_step: Step,
        part_names: &[String],
    ) -> Result<Vec<Action>, LifecycleError> {
        self.actions.clear();
        self.add_all_actions(target_step, part_names, None)?;
        Ok(std::mem::take(&mut self.actions))
    }

    /// Discard all ephemeral state and re-read persisted state from disk.
    pub fn reload_state(&mut self) -> Result<(), LifecycleError> {
        self.state = StateManager::new(&self.project_info, &self.part_list)?;
        Ok(())
    }

    fn add_all_actions(
        &mut self,
        target_step: Step,
        part_names: &[String],
        reason: Option<&str>,
    ) -> Result<(), LifecycleError> {
        let selected: Vec<Part> = part_list_by_name(part_names, &self.part_list)?
            .into_iter()
            .cloned()
            .collect();

        for current_step in target_step
            .previous_steps()
            .iter()
            .copied()
            .chain([target_step])
        {
            // Stage collisions are checked when the stage actions execute.
            for part in &selected {
                tracing::debug!(part = %part.name, step = %current_step, "process");
                self.add_step_actions(current_step, target_step, part, part_names, reason)?;
            }
        }
        Ok(())
    }

    /// Decide whether a single step of a single part should run, re-run,
    /// update, or be skipped.
    fn add_step_actions(
        &mut self,
        current_step: Step,
        target_step: Step,
        part: &Part,
        part_names: &[String],
        reason: Option<&str>,
    ) -> Result<(), LifecycleError> {
        // If the step never ran, run it.
        if !self.state.has_step_run(part, current_step) {
            self.run_step(part, current_step, reason, false)?;
            return Ok(());
        }

        // The step has already run. Re-run it if it is the exact step
        // that was requested for an explicitly listed part.
        if !part_names.is_empty()
            && current_step == target_step
            && part_names.iter().any(|n| *n == part.name)
        {
            let reason = reason.unwrap_or("requested step");
            self.rerun_step(part, current_step, Some(reason))?;
            return Ok(());
        }

        // Re-run a dirty step: properties or project options it uses
        // changed, or a dependency was re-staged.
        if let Some(dirty_report) = self.state.dirty_report(part, current_step)? {
            let summary = dirty_report.summary();
            tracing::debug!(
                part = %part.name,
                step = %current_step,
                summary = %summary,
                "step is dirty"
            );
            self.rerun_step(part, current_step, Some(summary.as_str()))?;
            return Ok(());
        }

        // An outdated step is refreshed in place where possible (pull and
        // build), and re-run otherwise.
        if let Some(outdated_report) = self.state.outdated_report(part, current_step) {
            tracing::debug!(part = %part.name, step = %current_step, "step is outdated");
            let summary = outdated_report.summary();
            if matches!(current_step, Step::Pull | Step::Build) {
                self.update_step(part, current_step, Some(summary.as_str()));
            } else {
                self.rerun_step(part, current_step, Some(summary.as_str()))?;
            }
            self.state.mark_step_updated(part, current_step);
            return Ok(());
        }

        self.add_action(part, current_step, ActionType::Skip, Some("already ran"));
        Ok(())
    }

    /// Bring dependencies up to the prerequisite step before a part runs
    /// a step that consumes them.
    fn prepare_step(&mut self, part: &Part, step: Step) -> Result<(), LifecycleError> {
        let Some(prerequisite_step) = step.dependency_prerequisite_step() else {
            return Ok(());
        };

        let dependencies: Vec<Part> = part_dependencies(&part.name, &self.part_list, true)?
            .into_iter()
            .cloned()
            .collect();

        for dependency in dependencies {
            if self.state.should_step_run(&dependency, prerequisite_step)? {
                let reason = format!("required to {} {:?}", step.name(), part.name);
                self.add_all_actions(
                    prerequisite_step,
                    &[dependency.name.clone()],
                    Some(reason.as_str()),
                )?;
            }
        }
        Ok(())
    }

    fn run_step(
        &mut self,
        part: &Part,
        step: Step,
        reason: Option<&str>,
        rerun: bool,
    ) -> Result<(), LifecycleError> {
        self.prepare_step(part, step)?;

        let action_type = if rerun {
            ActionType::Rerun
        } else {
            ActionType::Run
        };
        self.add_action(part, step, action_type, reason);

        // Eagerly record an ephemeral state with the current inputs so
        // later planning decisions see this step as satisfied. The
        // executor replaces it with the real contents when the action
        // actually runs.
        let state = self.synthesize_state(part, step)?;
        self.state.set_state(part, step, state);
        Ok(())
    }

    fn rerun_step(
        &mut self,
        part: &Part,
        step: Step,
        reason: Option<&str>,
    ) -> Result<(), LifecycleError> {
        tracing::debug!(part = %part.name, step = %step, "rerun step");
        self.state.clean_part(part, step);
        self.run_step(part, step, reason, true)
    }

    fn update_step(&mut self, part: &Part, step: Step, reason: Option<&str>) {
        tracing::debug!(part = %part.name, step = %step, "update step");
        self.add_action(part, step, ActionType::Update, reason);
        self.state.update_state_timestamp(part, step);
    }

    fn add_action(&mut self, part: &Part, step: Step, action_type: ActionType, reason: Option<&str>) {
        tracing::debug!(part = %part.name, step = %step, action = ?action_type, "add action");
        self.actions.push(Action::new(
            part.name.clone(),
            step,
            action_type,
            reason.map(String::from),
        ));
    }

    fn synthesize_state(&self, part: &Part, step: Step) -> Result<PartState, LifecycleError> {
        let part_properties = part.spec.marshal();
        let project_options = self.project_info.project_options();

        let state = match step {
            Step::Pull => PartState::Pull {
                part_properties,
                project_options,
                assets: Properties::new(),
            },
            Step::Build => {
                let part_info = PartInfo::new(&self.project_info, part);
                let plugin = plugins::plugin_for_part(part, &part_info)?;

                let mut build_packages: BTreeSet<String> = plugin.get_build_packages();
                build_packages.extend(part.spec.build_packages.iter().cloned());
                let mut build_snaps: BTreeSet<String> = plugin.get_build_snaps();
                build_snaps.extend(part.spec.build_snaps.iter().cloned());

                let mut assets = Properties::new();
                assets.insert(
                    "build-packages".to_string(),
                    to_yaml_list(&build_packages),
                );
                assets.insert("build-snaps".to_string(), to_yaml_list(&build_snaps));

                PartState::Build {
                    part_properties,
                    project_options,
                    assets,
                }
            }
            Step::Stage => PartState::Stage {
                part_properties,
                project_options,
                files: BTreeSet::new(),
                directories: BTreeSet::new(),
            },
            Step::Prime => PartState::Prime {
                part_properties,
                project_options,
                files: BTreeSet::new(),
                directories: BTreeSet::new(),
            },
        };
        Ok(state)
    }
}

fn to_yaml_list(values: &BTreeSet<String>) -> serde_yaml::Value {
    serde_yaml::Value::Sequence(
        values
            .iter()
            .map(|v| serde_yaml::Value::String(v.clone()))
            .collect(),
    )
}

#[cfg(test)]
#[path = "sequencer_tests.rs"]
mod tests;
