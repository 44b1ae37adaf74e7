// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The parts lifecycle manager: the crate's public entry point.

use crate::callbacks::Callbacks;
use crate::error::LifecycleError;
use crate::executor::Executor;
use crate::sequencer::Sequencer;
use partcraft_adapters::packages::{NoopRepository, Repository};
use partcraft_core::{parse_parts_document, Action, Part, ProjectInfo, Step};
use std::path::PathBuf;
use std::sync::Arc;

/// Construction options for a [`LifecycleManager`].
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Used to namespace persistent data such as the download cache.
    pub application_name: String,
    /// Top-level directory of the work tree.
    pub work_dir: PathBuf,
    /// Target architecture; defaults to the host's.
    pub target_arch: Option<String>,
    /// Concurrency handed to plugins (e.g. `make -j`).
    pub parallel_build_count: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            application_name: "partcraft".to_string(),
            work_dir: PathBuf::from("."),
            target_arch: None,
            parallel_build_count: 1,
        }
    }
}

/// Coordinates the planning and execution of the parts lifecycle.
pub struct LifecycleManager {
    project_info: ProjectInfo,
    part_list: Vec<Part>,
    sequencer: Sequencer,
    executor: Executor,
    callbacks: Callbacks,
    repository: Arc<dyn Repository>,
}

impl LifecycleManager {
    /// Build a manager from a parts document, with no package
    /// repository wired in.
    pub fn new(parts_document: &str, config: ManagerConfig) -> Result<Self, LifecycleError> {
        Self::with_repository(parts_document, config, Arc::new(NoopRepository::new()))
    }

    /// Build a manager with an OS package repository adapter.
    pub fn with_repository(
        parts_document: &str,
        config: ManagerConfig,
        repository: Arc<dyn Repository>,
    ) -> Result<Self, LifecycleError> {
        let project_info = ProjectInfo::new(
            config.application_name,
            config.work_dir,
            config.target_arch,
            config.parallel_build_count,
        );

        let parts = parse_parts_document(parts_document, project_info.dirs())?;
        let sequencer = Sequencer::new(parts, project_info.clone())?;
        let part_list = sequencer.part_list().to_vec();
        let executor = Executor::new(project_info.clone(), part_list.clone(), repository.clone());

        Ok(Self {
            project_info,
            part_list,
            sequencer,
            executor,
            callbacks: Callbacks::new(),
            repository,
        })
    }

    /// The parts of this project, in topological order.
    pub fn part_list(&self) -> &[Part] {
        &self.part_list
    }

    pub fn project_info(&self) -> &ProjectInfo {
        &self.project_info
    }

    /// The callback bundle run around steps and execution contexts.
    pub fn callbacks_mut(&mut self) -> &mut Callbacks {
        &mut self.callbacks
    }

    /// Obtain the list of actions to reach `target_step` for the named
    /// parts (all parts when none are named).
    pub fn plan(
        &mut self,
        target_step: Step,
        part_names: &[String],
    ) -> Result<Vec<Action>, LifecycleError> {
        self.sequencer.plan(target_step, part_names)
    }

    /// Discard ephemeral state and re-read persisted state from disk.
    pub fn reload_state(&mut self) -> Result<(), LifecycleError> {
        self.sequencer.reload_state()
    }

    /// Refresh the list of packages available to parts.
    ///
    /// Should happen before planning; updating between planning and
    /// execution would let the two disagree.
    pub async fn update(&self, refresh_build_packages: bool) -> Result<(), LifecycleError> {
        self.repository
            .update_package_list(
                self.project_info.application_name(),
                self.project_info.target_arch(),
            )
            .await?;
        if refresh_build_packages {
            self.repository.refresh_build_packages().await?;
        }
        Ok(())
    }

    /// Start an execution context: runs the prologue (build package
    /// installation and prologue callbacks) and returns a guard through
    /// which actions are executed.
    pub async fn execution_context(&mut self) -> Result<ExecutionContext<'_>, LifecycleError> {
        self.callbacks
            .run_prologue(&self.project_info, &self.part_list);
        self.executor.prologue().await?;
        Ok(ExecutionContext { manager: self })
    }

    /// Clean the named parts (all parts when none are named) down to
    /// `step`, defaulting to a full clean from pull.
    pub fn clean(&mut self, step: Option<Step>, part_names: &[String]) -> Result<(), LifecycleError> {
        let initial_step = step.unwrap_or(Step::Pull);
        self.executor.clean(initial_step, part_names)?;
        self.sequencer.reload_state()
    }
}

/// Scope for executing planned actions.
///
/// Obtained from [`LifecycleManager::execution_context`]; call
/// [`ExecutionContext::finish`] when done so the epilogue runs.
pub struct ExecutionContext<'a> {
    manager: &'a mut LifecycleManager,
}

impl ExecutionContext<'_> {
    /// Execute the given actions in order.
    pub async fn execute(&mut self, actions: &[Action]) -> Result<(), LifecycleError> {
        for action in actions {
            self.manager
                .executor
                .run_action(action, &self.manager.callbacks)
                .await?;
        }
        Ok(())
    }

    /// Finish the execution context, running the epilogue.
    pub async fn finish(self) -> Result<(), LifecycleError> {
        self.manager.executor.epilogue().await?;
        self.manager
            .callbacks
            .run_epilogue(&self.manager.project_info, &self.manager.part_list);
        Ok(())
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
