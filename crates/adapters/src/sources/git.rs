// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git repository source handler.

use super::{SourceError, SourceHandler, SourceOptions, UpdateCheck};
use crate::subprocess;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Clone or refresh a git repository into the source directory.
#[derive(Debug, Clone)]
pub struct GitSource {
    url: String,
    source_dir: PathBuf,
    options: SourceOptions,
}

impl GitSource {
    pub fn new(url: String, source_dir: PathBuf, options: SourceOptions) -> Self {
        Self {
            url,
            source_dir,
            options,
        }
    }

    async fn clone_repository(&self) -> Result<(), SourceError> {
        let mut cmd = Command::new("git");
        cmd.arg("clone");
        if let Some(depth) = self.options.depth {
            cmd.arg("--depth").arg(depth.to_string());
        }
        // A tag is just a ref; both map to git's --branch.
        if let Some(reference) = self.options.branch.as_ref().or(self.options.tag.as_ref()) {
            cmd.arg("--branch").arg(reference);
        }
        if self.options.submodules.unwrap_or(true) {
            cmd.arg("--recurse-submodules");
        }
        cmd.arg(&self.url).arg(&self.source_dir);

        subprocess::run_checked(cmd, subprocess::GIT_TIMEOUT, "git clone")
            .await
            .map_err(SourceError::Pull)?;

        if let Some(commit) = &self.options.commit {
            let mut cmd = Command::new("git");
            cmd.arg("-C")
                .arg(&self.source_dir)
                .args(["checkout", commit]);
            subprocess::run_checked(cmd, subprocess::GIT_TIMEOUT, "git checkout")
                .await
                .map_err(SourceError::Pull)?;
        }
        Ok(())
    }

    async fn pull_existing(&self) -> Result<(), SourceError> {
        let reference = self
            .options
            .commit
            .clone()
            .or_else(|| self.options.tag.as_ref().map(|t| format!("refs/tags/{t}")))
            .or_else(|| {
                self.options
                    .branch
                    .as_ref()
                    .map(|b| format!("refs/remotes/origin/{b}"))
            });

        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.source_dir).arg("fetch");
        if self.options.submodules.unwrap_or(true) {
            cmd.arg("--recurse-submodules=yes");
        }
        subprocess::run_checked(cmd, subprocess::GIT_TIMEOUT, "git fetch")
            .await
            .map_err(SourceError::Pull)?;

        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.source_dir);
        match reference {
            Some(reference) => {
                cmd.args(["reset", "--hard", &reference]);
            }
            None => {
                cmd.args(["reset", "--hard", "FETCH_HEAD"]);
            }
        }
        subprocess::run_checked(cmd, subprocess::GIT_TIMEOUT, "git reset")
            .await
            .map_err(SourceError::Pull)?;
        Ok(())
    }
}

#[async_trait]
impl SourceHandler for GitSource {
    async fn pull(&self) -> Result<(), SourceError> {
        if self.source_dir.join(".git").exists() {
            self.pull_existing().await
        } else {
            self.clone_repository().await
        }
    }

    async fn update(&self) -> Result<(), SourceError> {
        self.pull_existing().await
    }

    fn check(&self, _state_file: &Path) -> Result<UpdateCheck, SourceError> {
        Ok(UpdateCheck::Unsupported)
    }
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
