// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source checksum declarations of the form `<algorithm>/<digest>`.

use crate::fs_utils;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChecksumError {
    #[error("invalid checksum format: {0:?}")]
    InvalidFormat(String),
    #[error("unsupported checksum algorithm: {0:?}")]
    UnsupportedAlgorithm(String),
    #[error("expected digest {expected}, file has {actual}")]
    Mismatch { expected: String, actual: String },
    #[error("cannot hash {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Split a `<algorithm>/<digest>` declaration.
///
/// Only the first slash separates; the digest may itself contain slashes.
pub fn split_checksum(checksum: &str) -> Result<(&str, &str), ChecksumError> {
    checksum
        .split_once('/')
        .ok_or_else(|| ChecksumError::InvalidFormat(checksum.to_string()))
}

/// Verify that the file at `path` matches the declared checksum.
pub fn verify_checksum(checksum: &str, path: &Path) -> Result<(), ChecksumError> {
    let (algorithm, expected) = split_checksum(checksum)?;

    let actual = fs_utils::calculate_hash(path, algorithm)
        .map_err(|source| ChecksumError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| ChecksumError::UnsupportedAlgorithm(algorithm.to_string()))?;

    if actual == expected {
        Ok(())
    } else {
        Err(ChecksumError::Mismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}

#[cfg(test)]
#[path = "checksum_tests.rs"]
mod tests;
