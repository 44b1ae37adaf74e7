// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content-addressed file cache.
//!
//! Cached files live under `<xdg-cache>/<application>/<namespace>/
//! <algorithm>/<digest>`. Entries are verified before caching and copied
//! (never hard-linked) so a rebuilt artifact cannot mutate a cache hit in
//! place. Writes go through a temp file plus rename, which keeps
//! concurrent writers of the same digest safe.

use crate::fs_utils;
use std::fs;
use std::path::{Path, PathBuf};

/// Generic file cache addressed by `(algorithm, digest)`.
#[derive(Debug, Clone)]
pub struct FileCache {
    cache_root: PathBuf,
}

impl FileCache {
    /// Open (or define) a cache for the given application and namespace.
    ///
    /// Falls back to `.cache` under the current directory when the system
    /// reports no cache directory.
    pub fn new(application_name: &str, namespace: &str) -> Self {
        let base = dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".cache"));
        Self {
            cache_root: base.join(application_name).join(namespace),
        }
    }

    /// A cache rooted at an explicit directory.
    pub fn with_root(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
        }
    }

    /// Cache a file revision, unless it is already cached.
    ///
    /// The file is hashed first; a digest mismatch skips caching and
    /// returns `None`. Returns the path of the cached copy otherwise.
    pub fn cache(&self, file: &Path, algorithm: &str, digest: &str) -> Option<PathBuf> {
        match fs_utils::calculate_hash(file, algorithm) {
            Ok(Some(actual)) if actual == digest => {}
            Ok(_) => {
                tracing::warn!(
                    file = %file.display(),
                    "skipping caching, digest does not match the one provided"
                );
                return None;
            }
            Err(err) => {
                tracing::warn!(file = %file.display(), error = %err, "cannot hash file for caching");
                return None;
            }
        }

        let cached = self.entry_path(algorithm, digest);
        if cached.is_file() {
            return Some(cached);
        }

        let result = cached.parent().map(fs::create_dir_all).transpose().and_then(|_| {
            let temp = cached.with_extension("partial");
            fs::copy(file, &temp)?;
            fs::rename(&temp, &cached)?;
            Ok(())
        });

        match result {
            Ok(()) => Some(cached),
            Err(err) => {
                tracing::warn!(file = %cached.display(), error = %err, "unable to cache file");
                None
            }
        }
    }

    /// The cached file matching `(algorithm, digest)`, if present.
    pub fn get(&self, algorithm: &str, digest: &str) -> Option<PathBuf> {
        let cached = self.entry_path(algorithm, digest);
        if cached.is_file() {
            tracing::debug!(digest, "cache hit");
            Some(cached)
        } else {
            None
        }
    }

    fn entry_path(&self, algorithm: &str, digest: &str) -> PathBuf {
        self.cache_root.join(algorithm).join(digest)
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
