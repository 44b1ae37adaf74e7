// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tar archive source handler.

use super::{SourceError, SourceHandler, UpdateCheck};
use crate::cache::FileCache;
use crate::checksum;
use crate::subprocess;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Unpack a local tar archive into the source directory.
///
/// Checksummed archives are kept in the application's download cache,
/// so a re-pull of an unchanged revision extracts the cached copy. A
/// sole top-level directory in the archive is stripped, so tarballs of
/// the usual `project-1.2.3/` shape unpack to the tree itself.
#[derive(Debug, Clone)]
pub struct TarSource {
    source: PathBuf,
    source_dir: PathBuf,
    source_checksum: Option<String>,
    cache: FileCache,
}

impl TarSource {
    pub fn new(
        source: PathBuf,
        source_dir: PathBuf,
        source_checksum: Option<String>,
        application_name: &str,
    ) -> Self {
        Self {
            source,
            source_dir,
            source_checksum,
            cache: FileCache::new(application_name, "download"),
        }
    }

    /// Replace the download cache (e.g. with one rooted elsewhere).
    pub fn with_cache(mut self, cache: FileCache) -> Self {
        self.cache = cache;
        self
    }

    async fn provision(&self) -> Result<(), SourceError> {
        let archive = self.verified_archive()?;

        fs::create_dir_all(&self.source_dir)?;

        let mut cmd = Command::new("tar");
        cmd.arg("-xf").arg(&archive).arg("-C").arg(&self.source_dir);
        subprocess::run_checked(cmd, subprocess::TAR_TIMEOUT, "tar extraction")
            .await
            .map_err(SourceError::Pull)?;

        self.strip_sole_top_directory()?;
        Ok(())
    }

    /// The archive to extract: the declared revision from the download
    /// cache when available, the source file (verified and cached)
    /// otherwise.
    fn verified_archive(&self) -> Result<PathBuf, SourceError> {
        let Some(declared) = &self.source_checksum else {
            if !self.source.is_file() {
                return Err(SourceError::Pull(format!(
                    "{:?} is not a file",
                    self.source
                )));
            }
            return Ok(self.source.clone());
        };

        let (algorithm, digest) = checksum::split_checksum(declared)?;
        if let Some(cached) = self.cache.get(algorithm, digest) {
            return Ok(cached);
        }

        if !self.source.is_file() {
            return Err(SourceError::Pull(format!(
                "{:?} is not a file",
                self.source
            )));
        }
        checksum::verify_checksum(declared, &self.source)?;
        Ok(self
            .cache
            .cache(&self.source, algorithm, digest)
            .unwrap_or_else(|| self.source.clone()))
    }

    /// If extraction produced exactly one top-level directory, hoist its
    /// contents up one level.
    fn strip_sole_top_directory(&self) -> Result<(), SourceError> {
        let mut entries = fs::read_dir(&self.source_dir)?;
        let (Some(first), None) = (entries.next(), entries.next()) else {
            return Ok(());
        };
        let top = first?.path();
        if !top.is_dir() || top.is_symlink() {
            return Ok(());
        }

        for child in fs::read_dir(&top)? {
            let child = child?;
            fs::rename(child.path(), self.source_dir.join(child.file_name()))?;
        }
        fs::remove_dir(&top)?;
        Ok(())
    }
}

#[async_trait]
impl SourceHandler for TarSource {
    async fn pull(&self) -> Result<(), SourceError> {
        self.provision().await
    }

    async fn update(&self) -> Result<(), SourceError> {
        self.provision().await
    }

    fn check(&self, _state_file: &Path) -> Result<UpdateCheck, SourceError> {
        Ok(UpdateCheck::Unsupported)
    }
}

#[cfg(test)]
#[path = "tar_tests.rs"]
mod tests;
