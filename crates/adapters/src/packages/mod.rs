// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OS package repository adapters.
//!
//! The engine consumes build and stage packages through the
//! [`Repository`] trait; wiring a real package manager (apt, dnf, ...)
//! is left to the embedding application. The default [`NoopRepository`]
//! declares nothing and installs nothing, which is the right behavior
//! for projects whose parts don't use OS packages.

mod noop;
pub mod normalize;

pub use noop::NoopRepository;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeRepository, RepositoryCall};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from the OS package layer.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("build package {0:?} not found in the repository")]
    BuildPackageNotFound(String),
    #[error("package {package:?} has unmet dependencies: {deps:?}")]
    PackageBroken { package: String, deps: Vec<String> },
    #[error("failed to refresh the package list: {0}")]
    CacheUpdateFailed(String),
    #[error("failed to fetch packages: {0}")]
    PackageFetchError(String),
    #[error("cannot unpack {path:?}: {message}")]
    UnpackError {
        path: std::path::PathBuf,
        message: String,
    },
    #[error("package i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Adapter over the system's package manager.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Refresh the list of packages available to this application.
    async fn update_package_list(
        &self,
        application_name: &str,
        target_arch: &str,
    ) -> Result<(), PackageError>;

    /// Refresh the system's list of installable build packages.
    async fn refresh_build_packages(&self) -> Result<(), PackageError>;

    /// Install the named build packages on the host, returning the
    /// resolved `name=version` list.
    async fn install_build_packages(&self, names: &[String]) -> Result<Vec<String>, PackageError>;

    /// Download the named stage packages (and their dependencies) into
    /// `stage_packages_path`, returning the resolved `name=version` list.
    async fn fetch_stage_packages(
        &self,
        application_name: &str,
        names: &[String],
        target_arch: &str,
        stage_packages_path: &Path,
    ) -> Result<Vec<String>, PackageError>;

    /// Unpack previously fetched stage packages into `install_path`.
    async fn unpack_stage_packages(
        &self,
        stage_packages_path: &Path,
        install_path: &Path,
    ) -> Result<(), PackageError>;
}
