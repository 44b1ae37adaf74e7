// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project-wide settings and directory layout.

use crate::part::Part;
use crate::step::Step;
use crate::Properties;
use std::path::{Path, PathBuf};

/// Directory layout shared by all parts of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDirs {
    work_dir: PathBuf,
}

impl ProjectDirs {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    /// Top-level directory of the work tree.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Directory holding per-part work trees and state.
    pub fn parts_dir(&self) -> PathBuf {
        self.work_dir.join("parts")
    }

    /// Shared merge destination of the stage step.
    pub fn stage_dir(&self) -> PathBuf {
        self.work_dir.join("stage")
    }

    /// Shared merge destination of the prime step.
    pub fn prime_dir(&self) -> PathBuf {
        self.work_dir.join("prime")
    }
}

/// Project-wide information handed to the sequencer and executor.
#[derive(Debug, Clone)]
pub struct ProjectInfo {
    application_name: String,
    target_arch: String,
    parallel_build_count: usize,
    dirs: ProjectDirs,
}

impl ProjectInfo {
    pub fn new(
        application_name: impl Into<String>,
        work_dir: impl Into<PathBuf>,
        target_arch: Option<String>,
        parallel_build_count: usize,
    ) -> Self {
        Self {
            application_name: application_name.into(),
            target_arch: target_arch.unwrap_or_else(|| std::env::consts::ARCH.to_string()),
            parallel_build_count: parallel_build_count.max(1),
            dirs: ProjectDirs::new(work_dir),
        }
    }

    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    pub fn target_arch(&self) -> &str {
        &self.target_arch
    }

    pub fn parallel_build_count(&self) -> usize {
        self.parallel_build_count
    }

    pub fn dirs(&self) -> &ProjectDirs {
        &self.dirs
    }

    /// The project options steps may declare an interest in.
    ///
    /// Stored in step states and diffed against the current values to
    /// decide whether a step went dirty.
    pub fn project_options(&self) -> Properties {
        let mut options = Properties::new();
        options.insert(
            "target_arch".to_string(),
            serde_yaml::Value::String(self.target_arch.clone()),
        );
        options
    }
}

/// Per-part view of the project, handed to plugins.
#[derive(Debug, Clone)]
pub struct PartInfo {
    pub application_name: String,
    pub target_arch: String,
    pub parallel_build_count: usize,
    pub part_name: String,
    pub part_src_dir: PathBuf,
    pub part_build_dir: PathBuf,
    pub part_install_dir: PathBuf,
    pub stage_dir: PathBuf,
    pub prime_dir: PathBuf,
}

impl PartInfo {
    pub fn new(project: &ProjectInfo, part: &Part) -> Self {
        Self {
            application_name: project.application_name.clone(),
            target_arch: project.target_arch.clone(),
            parallel_build_count: project.parallel_build_count,
            part_name: part.name.clone(),
            part_src_dir: part.part_src_dir(),
            part_build_dir: part.part_build_dir(),
            part_install_dir: part.part_install_dir(),
            stage_dir: part.stage_dir(),
            prime_dir: part.prime_dir(),
        }
    }
}

/// Per-step view of a part, handed to step callbacks.
#[derive(Debug, Clone)]
pub struct StepInfo {
    pub part_info: PartInfo,
    pub step: Step,
}

impl StepInfo {
    pub fn new(part_info: PartInfo, step: Step) -> Self {
        Self { part_info, step }
    }
}
