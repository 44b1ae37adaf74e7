// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake package repository for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{PackageError, Repository};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded repository operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryCall {
    UpdatePackageList { target_arch: String },
    RefreshBuildPackages,
    InstallBuildPackages { names: Vec<String> },
    FetchStagePackages { names: Vec<String> },
    UnpackStagePackages { install_path: PathBuf },
}

struct FakeRepositoryState {
    calls: Vec<RepositoryCall>,
    versions: HashMap<String, String>,
    package_files: HashMap<String, Vec<(String, Vec<u8>)>>,
}

/// Fake package repository for testing.
///
/// Resolves every requested package to a recorded version and, when
/// unpacking, materializes the files registered for it.
#[derive(Clone)]
pub struct FakeRepository {
    inner: Arc<Mutex<FakeRepositoryState>>,
}

impl Default for FakeRepository {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeRepositoryState {
                calls: Vec::new(),
                versions: HashMap::new(),
                package_files: HashMap::new(),
            })),
        }
    }
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the version a package resolves to (defaults to "1.0").
    pub fn with_version(self, name: &str, version: &str) -> Self {
        self.inner
            .lock()
            .versions
            .insert(name.to_string(), version.to_string());
        self
    }

    /// Register a file materialized when the package is unpacked.
    pub fn with_package_file(self, name: &str, path: &str, contents: &[u8]) -> Self {
        self.inner
            .lock()
            .package_files
            .entry(name.to_string())
            .or_default()
            .push((path.to_string(), contents.to_vec()));
        self
    }

    /// Get all recorded operations
    pub fn calls(&self) -> Vec<RepositoryCall> {
        self.inner.lock().calls.clone()
    }

    fn resolve(&self, names: &[String]) -> Vec<String> {
        let state = self.inner.lock();
        names
            .iter()
            .map(|name| {
                let version = state
                    .versions
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| "1.0".to_string());
                format!("{name}={version}")
            })
            .collect()
    }
}

#[async_trait]
impl Repository for FakeRepository {
    async fn update_package_list(
        &self,
        _application_name: &str,
        target_arch: &str,
    ) -> Result<(), PackageError> {
        self.inner
            .lock()
            .calls
            .push(RepositoryCall::UpdatePackageList {
                target_arch: target_arch.to_string(),
            });
        Ok(())
    }

    async fn refresh_build_packages(&self) -> Result<(), PackageError> {
        self.inner
            .lock()
            .calls
            .push(RepositoryCall::RefreshBuildPackages);
        Ok(())
    }

    async fn install_build_packages(&self, names: &[String]) -> Result<Vec<String>, PackageError> {
        self.inner
            .lock()
            .calls
            .push(RepositoryCall::InstallBuildPackages {
                names: names.to_vec(),
            });
        Ok(self.resolve(names))
    }

    async fn fetch_stage_packages(
        &self,
        _application_name: &str,
        names: &[String],
        _target_arch: &str,
        stage_packages_path: &Path,
    ) -> Result<Vec<String>, PackageError> {
        self.inner
            .lock()
            .calls
            .push(RepositoryCall::FetchStagePackages {
                names: names.to_vec(),
            });
        std::fs::create_dir_all(stage_packages_path)?;
        for resolved in self.resolve(names) {
            std::fs::write(stage_packages_path.join(format!("{resolved}.pkg")), b"")?;
        }
        Ok(self.resolve(names))
    }

    async fn unpack_stage_packages(
        &self,
        stage_packages_path: &Path,
        install_path: &Path,
    ) -> Result<(), PackageError> {
        self.inner
            .lock()
            .calls
            .push(RepositoryCall::UnpackStagePackages {
                install_path: install_path.to_path_buf(),
            });

        let state = self.inner.lock();
        for entry in std::fs::read_dir(stage_packages_path)? {
            let file_name = entry?.file_name().to_string_lossy().to_string();
            let Some(name) = file_name.split('=').next() else {
                continue;
            };
            if let Some(files) = state.package_files.get(name) {
                for (path, contents) in files {
                    let dest = install_path.join(path);
                    if let Some(parent) = dest.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(dest, contents)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
