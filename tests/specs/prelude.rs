// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for the lifecycle specs.

use partcraft_core::{Action, ActionType, Step};
use partcraft_engine::{LifecycleManager, ManagerConfig};
use std::fs;
use std::path::{Path, PathBuf};

/// A scratch project: a work tree, upstream source trees, and a parts
/// document.
pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Create an upstream source tree for a part to pull from.
    pub fn upstream(&self, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let root = self.dir.path().join(name);
        for (rel, contents) in files {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }
        fs::create_dir_all(&root).unwrap();
        root
    }

    pub fn manager(&self, document: &str) -> LifecycleManager {
        let config = ManagerConfig {
            work_dir: self.dir.path().to_path_buf(),
            ..ManagerConfig::default()
        };
        LifecycleManager::new(document, config).unwrap()
    }

    /// Plan and execute everything needed to reach `step`.
    pub async fn run_to(&self, manager: &mut LifecycleManager, step: Step) -> Vec<Action> {
        let actions = manager.plan(step, &[]).unwrap();
        let mut context = manager.execution_context().await.unwrap();
        context.execute(&actions).await.unwrap();
        context.finish().await.unwrap();
        actions
    }
}

/// Compact rendering of a plan for order assertions.
pub fn brief(actions: &[Action]) -> Vec<String> {
    actions
        .iter()
        .map(|a| format!("{:?} {}:{}", a.action_type, a.part_name, a.step))
        .collect()
}

pub fn all_skips(actions: &[Action]) -> bool {
    actions.iter().all(|a| a.action_type == ActionType::Skip)
}
