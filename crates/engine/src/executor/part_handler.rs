// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution of a single action, end to end.

use crate::error::ExecutionError;
use crate::executor::environment::generate_step_environment;
use crate::executor::migration;
use crate::executor::runner::Runner;
use crate::plugins::{plugin_for_part, Plugin};
use partcraft_adapters::fs_utils;
use partcraft_adapters::packages::{normalize, Repository};
use partcraft_adapters::sources::{source_handler_for_part, SourceHandler};
use partcraft_core::{
    Action, ActionType, InternalError, Part, PartInfo, ProjectInfo, Properties, Step, StepInfo,
};
use partcraft_state::{persist, PartState};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Handles the execution of every action of one part.
pub struct PartHandler {
    part: Part,
    part_info: PartInfo,
    project_options: Properties,
    application_name: String,
    target_arch: String,
    plugin: Box<dyn Plugin>,
    source_handler: Option<Box<dyn SourceHandler>>,
    repository: Arc<dyn Repository>,
}

impl PartHandler {
    pub fn new(
        part: Part,
        project_info: &ProjectInfo,
        repository: Arc<dyn Repository>,
    ) -> Result<Self, ExecutionError> {
        let part_info = PartInfo::new(project_info, &part);
        let plugin = plugin_for_part(&part, &part_info)?;
        let source_handler = source_handler_for_part(&part, project_info.application_name())?;
        Ok(Self {
            part,
            part_info,
            project_options: project_info.project_options(),
            application_name: project_info.application_name().to_string(),
            target_arch: project_info.target_arch().to_string(),
            plugin,
            source_handler,
            repository,
        })
    }

    /// Execute one action for this part.
    pub async fn run_action(&self, action: &Action) -> Result<(), ExecutionError> {
        tracing::debug!(action = %action.message(), "execute");

        match action.action_type {
            ActionType::Skip => {
                tracing::debug!(
                    part = %self.part.name,
                    step = %action.step,
                    reason = action.reason.as_deref().unwrap_or(""),
                    "skipping"
                );
                Ok(())
            }
            ActionType::Update => match action.step {
                Step::Pull => self.update_pull().await,
                Step::Build => self.update_build().await,
                step => Err(ExecutionError::Internal(InternalError::new(format!(
                    "cannot update the {step} step"
                )))),
            },
            ActionType::Run | ActionType::Rerun => {
                if action.action_type == ActionType::Rerun {
                    clean_step_contents(&self.part, action.step)?;
                }
                match action.step {
                    Step::Pull => self.run_pull().await,
                    Step::Build => self.run_build().await,
                    Step::Stage => self.run_stage().await,
                    Step::Prime => self.run_prime().await,
                }
            }
        }
    }

    async fn run_pull(&self) -> Result<(), ExecutionError> {
        self.make_dirs()?;
        self.runner_for(Step::Pull).run().await?;

        let stage_packages = self.fetch_stage_packages().await?;

        self.write_state(PartState::Pull {
            part_properties: self.part.spec.marshal(),
            project_options: self.project_options.clone(),
            assets: package_assets("stage-packages", &stage_packages),
        })
    }

    async fn run_build(&self) -> Result<(), ExecutionError> {
        self.make_dirs()?;

        // The build works on a disposable mirror of the pulled source.
        fs_utils::link_or_copy_tree(&self.part.part_src_dir(), &self.part.part_build_dir(), &[])
            .map_err(ExecutionError::io("mirroring the source tree"))?;

        self.runner_for(Step::Build).run().await?;
        self.organize()?;

        self.write_state(PartState::Build {
            part_properties: self.part.spec.marshal(),
            project_options: self.project_options.clone(),
            assets: self.build_assets(),
        })
    }

    fn build_assets(&self) -> Properties {
        let mut build_packages: BTreeSet<String> = self.plugin.get_build_packages();
        build_packages.extend(self.part.spec.build_packages.iter().cloned());
        let mut build_snaps: BTreeSet<String> = self.plugin.get_build_snaps();
        build_snaps.extend(self.part.spec.build_snaps.iter().cloned());

        let mut assets = package_assets(
            "build-packages",
            &build_packages.into_iter().collect::<Vec<_>>(),
        );
        assets.extend(package_assets(
            "build-snaps",
            &build_snaps.into_iter().collect::<Vec<_>>(),
        ));
        assets
    }

    async fn run_stage(&self) -> Result<(), ExecutionError> {
        self.make_dirs()?;
        self.runner_for(Step::Stage).run().await?;

        // The install directory is the source of truth for what this
        // part owns in the shared tree, scriptlet or not.
        let (files, directories) = migration::stage_migration_sets(&self.part)?;
        self.write_state(PartState::Stage {
            part_properties: self.part.spec.marshal(),
            project_options: self.project_options.clone(),
            files,
            directories,
        })
    }

    async fn run_prime(&self) -> Result<(), ExecutionError> {
        self.make_dirs()?;
        self.runner_for(Step::Prime).run().await?;

        let (files, directories) = migration::prime_migration_sets(&self.part)?;
        self.write_state(PartState::Prime {
            part_properties: self.part.spec.marshal(),
            project_options: self.project_options.clone(),
            files,
            directories,
        })
    }

    /// Refresh the source in place after an outdated report.
    async fn update_pull(&self) -> Result<(), ExecutionError> {
        self.make_dirs()?;
        if let Some(handler) = &self.source_handler {
            handler.update().await?;
        }

        let stage_packages = self.fetch_stage_packages().await?;
        self.write_state(PartState::Pull {
            part_properties: self.part.spec.marshal(),
            project_options: self.project_options.clone(),
            assets: package_assets("stage-packages", &stage_packages),
        })
    }

    /// Re-run the build without cleaning first.
    async fn update_build(&self) -> Result<(), ExecutionError> {
        self.make_dirs()?;
        fs_utils::link_or_copy_tree(&self.part.part_src_dir(), &self.part.part_build_dir(), &[])
            .map_err(ExecutionError::io("mirroring the source tree"))?;

        self.runner_for(Step::Build).run().await?;
        self.organize()?;

        self.write_state(PartState::Build {
            part_properties: self.part.spec.marshal(),
            project_options: self.project_options.clone(),
            assets: self.build_assets(),
        })
    }

    fn runner_for(&self, step: Step) -> RunnerInvocation<'_> {
        let step_info = StepInfo::new(self.part_info.clone(), step);
        let environment = generate_step_environment(&self.part, self.plugin.as_ref(), &step_info);
        RunnerInvocation {
            handler: self,
            step,
            environment,
        }
    }

    async fn fetch_stage_packages(&self) -> Result<Vec<String>, ExecutionError> {
        let names = &self.part.spec.stage_packages;
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let packages_dir = self.part.part_packages_dir();
        let fetched = self
            .repository
            .fetch_stage_packages(
                &self.application_name,
                names,
                &self.target_arch,
                &packages_dir,
            )
            .await?;

        let install_dir = self.part.part_install_dir();
        self.repository
            .unpack_stage_packages(&packages_dir, &install_dir)
            .await?;
        normalize::normalize(&install_dir)
            .map_err(ExecutionError::io("normalizing unpacked packages"))?;

        Ok(fetched)
    }

    /// Apply the part's `organize` renames inside the install directory.
    fn organize(&self) -> Result<(), ExecutionError> {
        let install_dir = self.part.part_install_dir();
        for (from, to) in &self.part.spec.organize {
            let source = install_dir.join(from);
            let target = install_dir.join(to);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(ExecutionError::io(format!("organizing {from:?}")))?;
            }
            std::fs::rename(&source, &target)
                .map_err(ExecutionError::io(format!("organizing {from:?} to {to:?}")))?;
        }
        Ok(())
    }

    fn make_dirs(&self) -> Result<(), ExecutionError> {
        for path in [
            self.part.part_src_dir(),
            self.part.part_build_dir(),
            self.part.part_install_dir(),
            self.part.part_state_dir(),
            self.part.part_run_dir(),
            self.part.stage_dir(),
            self.part.prime_dir(),
        ] {
            std::fs::create_dir_all(&path)
                .map_err(ExecutionError::io(format!("creating {path:?}")))?;
        }
        Ok(())
    }

    fn write_state(&self, state: PartState) -> Result<(), ExecutionError> {
        let path = persist::state_file_path(&self.part, state.step());
        persist::write_state(&state, &path)?;
        Ok(())
    }
}

/// A prepared runner invocation; keeps the generated environment alive
/// for the borrow in [`Runner`].
struct RunnerInvocation<'a> {
    handler: &'a PartHandler,
    step: Step,
    environment: String,
}

impl RunnerInvocation<'_> {
    async fn run(&self) -> Result<(), ExecutionError> {
        let runner = Runner::new(
            &self.handler.part,
            self.step,
            &self.environment,
            self.handler.plugin.as_ref(),
            self.handler.source_handler.as_deref(),
        );
        runner.run().await
    }
}

fn package_assets(key: &str, values: &[String]) -> Properties {
    let mut assets = Properties::new();
    assets.insert(
        key.to_string(),
        serde_yaml::Value::Sequence(
            values
                .iter()
                .map(|v| serde_yaml::Value::String(v.clone()))
                .collect(),
        ),
    );
    assets
}

/// Remove what a step produced, ahead of a re-run or as part of clean.
///
/// Pull and build own whole directories; stage and prime own files in
/// the shared trees, tracked by the step's persisted state.
pub(crate) fn clean_step_contents(part: &Part, step: Step) -> Result<(), ExecutionError> {
    match step {
        Step::Pull => remove_dir(&part.part_src_dir()),
        Step::Build => {
            remove_dir(&part.part_build_dir())?;
            remove_dir(&part.part_install_dir())
        }
        Step::Stage => remove_migrated(part, Step::Stage, &part.stage_dir()),
        Step::Prime => remove_migrated(part, Step::Prime, &part.prime_dir()),
    }
}

fn remove_dir(path: &std::path::Path) -> Result<(), ExecutionError> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ExecutionError::Io {
            action: format!("removing {path:?}"),
            source,
        }),
    }
}

/// Remove a part's files from a shared step directory, using the
/// persisted state to know what the part owns. Directories are pruned
/// only when they end up empty; other parts may still own them.
fn remove_migrated(
    part: &Part,
    step: Step,
    shared_dir: &std::path::Path,
) -> Result<(), ExecutionError> {
    let state_path = persist::state_file_path(part, step);
    let Some((state, _)) = persist::read_state(step, &state_path)? else {
        return Ok(());
    };

    if let Some(files) = state.files() {
        for file in files {
            let path = shared_dir.join(file);
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(ExecutionError::Io {
                        action: format!("removing {path:?}"),
                        source,
                    })
                }
            }
        }
    }

    if let Some(directories) = state.directories() {
        for directory in directories.iter().rev() {
            // Ignore failures: the directory may be shared or already gone.
            let _ = std::fs::remove_dir(shared_dir.join(directory));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "part_handler_tests.rs"]
mod tests;
