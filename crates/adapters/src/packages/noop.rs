// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op package repository.

use super::{PackageError, Repository};
use async_trait::async_trait;
use std::path::Path;

/// A repository backed by nothing.
///
/// Declared packages are reported as not found, so misconfigured parts
/// fail loudly instead of silently building without their dependencies.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRepository;

impl NoopRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Repository for NoopRepository {
    async fn update_package_list(
        &self,
        _application_name: &str,
        _target_arch: &str,
    ) -> Result<(), PackageError> {
        Ok(())
    }

    async fn refresh_build_packages(&self) -> Result<(), PackageError> {
        Ok(())
    }

    async fn install_build_packages(&self, names: &[String]) -> Result<Vec<String>, PackageError> {
        match names.first() {
            None => Ok(Vec::new()),
            Some(name) => Err(PackageError::BuildPackageNotFound(name.clone())),
        }
    }

    async fn fetch_stage_packages(
        &self,
        _application_name: &str,
        names: &[String],
        _target_arch: &str,
        _stage_packages_path: &Path,
    ) -> Result<Vec<String>, PackageError> {
        match names.first() {
            None => Ok(Vec::new()),
            Some(name) => Err(PackageError::PackageFetchError(format!(
                "no package repository is configured, cannot fetch {name:?}"
            ))),
        }
    }

    async fn unpack_stage_packages(
        &self,
        _stage_packages_path: &Path,
        _install_path: &Path,
    ) -> Result<(), PackageError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "noop_tests.rs"]
mod tests;
