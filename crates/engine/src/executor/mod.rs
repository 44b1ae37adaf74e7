// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle action execution.

pub mod environment;
pub mod migration;
mod part_handler;
mod runner;

pub use part_handler::PartHandler;
pub use runner::Runner;

use crate::callbacks::Callbacks;
use crate::error::ExecutionError;
use crate::plugins::plugin_for_part;
use partcraft_core::{
    part_by_name, part_list_by_name, Action, ActionType, Part, PartInfo, ProjectInfo, Step,
    StepInfo,
};
use partcraft_adapters::packages::Repository;
use partcraft_state::persist;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Executes planned lifecycle actions.
pub struct Executor {
    project_info: ProjectInfo,
    part_list: Vec<Part>,
    repository: Arc<dyn Repository>,
}

impl Executor {
    pub fn new(
        project_info: ProjectInfo,
        part_list: Vec<Part>,
        repository: Arc<dyn Repository>,
    ) -> Self {
        Self {
            project_info,
            part_list,
            repository,
        }
    }

    /// Prepare the host for execution: install every build package the
    /// selected parts and their plugins declare.
    pub async fn prologue(&self) -> Result<(), ExecutionError> {
        let mut build_packages: BTreeSet<String> = BTreeSet::new();
        for part in &self.part_list {
            let part_info = PartInfo::new(&self.project_info, part);
            let plugin = plugin_for_part(part, &part_info)?;
            build_packages.extend(plugin.get_build_packages());
            build_packages.extend(part.spec.build_packages.iter().cloned());
        }

        if !build_packages.is_empty() {
            let names: Vec<String> = build_packages.into_iter().collect();
            let installed = self.repository.install_build_packages(&names).await?;
            tracing::info!(packages = ?installed, "installed build packages");
        }
        Ok(())
    }

    /// Finish the execution environment.
    pub async fn epilogue(&self) -> Result<(), ExecutionError> {
        Ok(())
    }

    /// Execute a single action.
    pub async fn run_action(
        &self,
        action: &Action,
        callbacks: &Callbacks,
    ) -> Result<(), ExecutionError> {
        let part = part_by_name(&action.part_name, &self.part_list)?.clone();

        if action.action_type == ActionType::Skip {
            tracing::debug!(
                action = %action.message(),
                reason = action.reason.as_deref().unwrap_or(""),
                "skip execution"
            );
            return Ok(());
        }

        // No file moves before the whole stage tree is known to merge.
        if action.step == Step::Stage {
            migration::check_stage_collisions(&self.part_list)?;
        }

        let handler = PartHandler::new(part.clone(), &self.project_info, self.repository.clone())?;
        let step_info = StepInfo::new(PartInfo::new(&self.project_info, &part), action.step);

        callbacks.run_pre_step(&step_info);
        handler.run_action(action).await?;
        callbacks.run_post_step(&step_info);
        Ok(())
    }

    /// Clean the selected parts down to (and including) `initial_step`.
    ///
    /// When no parts are named the shared directories are removed
    /// wholesale: the prime tree always, the stage tree from stage down,
    /// and the whole parts tree when cleaning from pull.
    pub fn clean(&self, initial_step: Step, part_names: &[String]) -> Result<(), ExecutionError> {
        let clean_all_parts = part_names.is_empty();
        let selected: Vec<Part> = part_list_by_name(part_names, &self.part_list)?
            .into_iter()
            .cloned()
            .collect();

        for part in &selected {
            for step in Step::ALL.iter().rev() {
                if *step < initial_step {
                    break;
                }
                part_handler::clean_step_contents(part, *step)?;
                persist::remove_state(&persist::state_file_path(part, *step))?;
            }
        }

        if clean_all_parts {
            let dirs = self.project_info.dirs();
            remove_tree(&dirs.prime_dir())?;
            if initial_step <= Step::Stage {
                remove_tree(&dirs.stage_dir())?;
            }
            if initial_step <= Step::Pull {
                remove_tree(&dirs.parts_dir())?;
            }
        }
        Ok(())
    }
}

fn remove_tree(path: &std::path::Path) -> Result<(), ExecutionError> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ExecutionError::Io {
            action: format!("removing {path:?}"),
            source,
        }),
    }
}
