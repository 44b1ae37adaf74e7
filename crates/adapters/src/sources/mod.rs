// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source handlers: fetch and refresh part source trees.

mod git;
mod local;
mod tar;

pub use git::GitSource;
pub use local::LocalSource;
pub use tar::TarSource;

use crate::checksum::ChecksumError;
use async_trait::async_trait;
use partcraft_core::Part;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from source handlers.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to pull source: {0}")]
    Pull(String),
    #[error(transparent)]
    Checksum(#[from] ChecksumError),
    #[error("source type {0:?} is not supported")]
    InvalidSourceType(String),
    #[error("cannot determine source type of {0:?}")]
    UnknownSourceType(String),
    #[error("{0:?} sources do not support updating")]
    UpdateUnsupported(&'static str),
    #[error("invalid source environment: {0}")]
    InvalidEnvironment(String),
    #[error("source i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of an upstream update check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateCheck {
    /// This source type cannot check for updates; not an error.
    Unsupported,
    UpToDate,
    Updated,
}

/// Strategy for fetching and refreshing a part's source tree.
#[async_trait]
pub trait SourceHandler: Send + Sync {
    /// Fetch the source into the part's source directory.
    async fn pull(&self) -> Result<(), SourceError>;

    /// Refresh the source directory in place.
    async fn update(&self) -> Result<(), SourceError>;

    /// Whether the upstream changed since the given state file was
    /// written. Checking is a capability; handlers without it report
    /// [`UpdateCheck::Unsupported`].
    fn check(&self, state_file: &Path) -> Result<UpdateCheck, SourceError>;
}

/// Source options shared by all handler types.
#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    pub checksum: Option<String>,
    pub branch: Option<String>,
    pub tag: Option<String>,
    pub commit: Option<String>,
    pub depth: Option<u32>,
    pub submodules: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceType {
    Local,
    Tar,
    Git,
}

fn detect_source_type(source: &str, explicit: Option<&str>) -> Result<SourceType, SourceError> {
    if let Some(explicit) = explicit {
        return match explicit {
            "local" => Ok(SourceType::Local),
            "tar" => Ok(SourceType::Tar),
            "git" => Ok(SourceType::Git),
            other => Err(SourceError::InvalidSourceType(other.to_string())),
        };
    }

    if source.ends_with(".git") || source.starts_with("git@") || source.starts_with("git+") {
        return Ok(SourceType::Git);
    }
    for suffix in [".tar", ".tar.gz", ".tgz", ".tar.bz2", ".tar.xz"] {
        if source.ends_with(suffix) {
            return Ok(SourceType::Tar);
        }
    }
    if !source.contains("://") {
        return Ok(SourceType::Local);
    }

    Err(SourceError::UnknownSourceType(source.to_string()))
}

/// Resolve the source handler for a part, if the part has a source.
pub fn source_handler_for_part(
    part: &Part,
    application_name: &str,
) -> Result<Option<Box<dyn SourceHandler>>, SourceError> {
    let Some(source) = part.spec.source.as_deref() else {
        return Ok(None);
    };

    let options = SourceOptions {
        checksum: part.spec.source_checksum.clone(),
        branch: part.spec.source_branch.clone(),
        tag: part.spec.source_tag.clone(),
        commit: part.spec.source_commit.clone(),
        depth: part.spec.source_depth,
        submodules: part.spec.source_submodules,
    };

    source_handler(
        source,
        part.spec.source_type.as_deref(),
        &part.part_src_dir(),
        &options,
        application_name,
    )
    .map(Some)
}

/// Resolve a source handler from a source declaration.
pub fn source_handler(
    source: &str,
    source_type: Option<&str>,
    source_dir: &Path,
    options: &SourceOptions,
    application_name: &str,
) -> Result<Box<dyn SourceHandler>, SourceError> {
    let handler: Box<dyn SourceHandler> = match detect_source_type(source, source_type)? {
        SourceType::Local => Box::new(LocalSource::new(
            PathBuf::from(source),
            source_dir.to_path_buf(),
        )),
        SourceType::Tar => Box::new(TarSource::new(
            PathBuf::from(source),
            source_dir.to_path_buf(),
            options.checksum.clone(),
            application_name,
        )),
        SourceType::Git => Box::new(GitSource::new(
            source.to_string(),
            source_dir.to_path_buf(),
            options.clone(),
        )),
    };
    Ok(handler)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
