// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local directory source handler.

use super::{SourceError, SourceHandler, UpdateCheck};
use crate::fs_utils;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Top-level entries never pulled from a local source; pulling the
/// project's own work tree into a part would recurse forever.
const IGNORED_ENTRIES: &[&str] = &["parts", "stage", "prime"];

/// Snapshot a local directory into the source directory, using hard
/// links so repeated pulls are cheap.
#[derive(Debug, Clone)]
pub struct LocalSource {
    source: PathBuf,
    source_dir: PathBuf,
}

impl LocalSource {
    pub fn new(source: PathBuf, source_dir: PathBuf) -> Self {
        Self { source, source_dir }
    }

    fn snapshot(&self) -> Result<(), SourceError> {
        if !self.source.is_dir() {
            return Err(SourceError::Pull(format!(
                "{:?} is not a directory",
                self.source
            )));
        }
        if self.source_dir.is_symlink() || self.source_dir.is_file() {
            return Err(SourceError::InvalidEnvironment(format!(
                "source directory {:?} is not a directory",
                self.source_dir
            )));
        }

        fs_utils::link_or_copy_tree(&self.source, &self.source_dir, IGNORED_ENTRIES)?;
        Ok(())
    }
}

#[async_trait]
impl SourceHandler for LocalSource {
    async fn pull(&self) -> Result<(), SourceError> {
        self.snapshot()
    }

    async fn update(&self) -> Result<(), SourceError> {
        // Hard links make a full re-snapshot as cheap as a partial one.
        self.snapshot()
    }

    fn check(&self, state_file: &Path) -> Result<UpdateCheck, SourceError> {
        let Ok(state_mtime) = std::fs::metadata(state_file).and_then(|m| m.modified()) else {
            return Ok(UpdateCheck::Updated);
        };

        let walker = walkdir::WalkDir::new(&self.source)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                !(e.depth() == 1 && IGNORED_ENTRIES.iter().any(|i| e.file_name() == *i))
            });
        for entry in walker {
            let entry = entry.map_err(|err| SourceError::Pull(err.to_string()))?;
            let metadata = entry
                .metadata()
                .map_err(|err| SourceError::Pull(err.to_string()))?;
            let mtime = metadata
                .modified()
                .map_err(|err| SourceError::Pull(err.to_string()))?;
            if mtime > state_mtime {
                return Ok(UpdateCheck::Updated);
            }
        }
        Ok(UpdateCheck::UpToDate)
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
