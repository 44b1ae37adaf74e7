// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Include/exclude file selection for staging and priming.

use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilesetError {
    #[error("path {path:?} must be relative in the {name} fileset")]
    AbsolutePath { name: String, path: String },
    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
    #[error("cannot scan {path:?}: {source}")]
    Scan {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

/// An ordered list of glob entries; entries starting with `-` exclude.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fileset {
    name: String,
    entries: Vec<String>,
}

impl Fileset {
    pub fn new(name: impl Into<String>, entries: &[String]) -> Self {
        Self {
            name: name.into(),
            entries: entries.to_vec(),
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Entries selecting files. Defaults to everything when no include is
    /// listed.
    pub fn includes(&self) -> Vec<&str> {
        let includes: Vec<&str> = self
            .entries
            .iter()
            .filter(|e| !e.starts_with('-'))
            .map(String::as_str)
            .collect();
        if includes.is_empty() {
            vec!["*"]
        } else {
            includes
        }
    }

    /// Entries removing files, with the leading `-` stripped.
    pub fn excludes(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| e.strip_prefix('-'))
            .collect()
    }

    /// Whether this fileset selects everything by default.
    pub fn is_catchall(&self) -> bool {
        self.entries.is_empty() || self.entries == ["*"]
    }

    /// Merge another fileset into this one.
    ///
    /// Used when priming without an explicit file list: the `*` include is
    /// replaced by the other fileset's entries, keeping our own excludes.
    pub fn combine(&mut self, other: &Fileset) {
        self.entries.retain(|e| e != "*");
        for entry in &other.entries {
            if !self.entries.contains(entry) {
                self.entries.push(entry.clone());
            }
        }
    }

    fn validate(&self) -> Result<(), FilesetError> {
        for entry in &self.entries {
            let path = entry.strip_prefix('-').unwrap_or(entry);
            if path.starts_with('/') {
                return Err(FilesetError::AbsolutePath {
                    name: self.name.clone(),
                    path: path.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Compute the files and directories a fileset selects under `srcdir`.
///
/// Returned paths are relative to `srcdir`. Directories explicitly
/// included are expanded to their whole contents; parents of every
/// selected file are included so migration can recreate the tree.
/// Symlinks count as files even when they point at directories.
pub fn migratable_filesets(
    fileset: &Fileset,
    srcdir: &Path,
) -> Result<(BTreeSet<String>, BTreeSet<String>), FilesetError> {
    fileset.validate()?;

    let include_files = generate_include_set(srcdir, &fileset.includes())?;
    let (exclude_files, exclude_dirs) = {
        let excludes = fileset.excludes();
        let excluded = generate_include_set(srcdir, &excludes)?;
        let mut files = BTreeSet::new();
        let mut dirs = BTreeSet::new();
        for path in excluded {
            if is_real_dir(&srcdir.join(&path)) {
                dirs.insert(path);
            } else {
                files.insert(path);
            }
        }
        (files, dirs)
    };

    let mut selected: BTreeSet<String> = include_files
        .difference(&exclude_files)
        .cloned()
        .collect();
    selected.retain(|path| {
        !exclude_dirs
            .iter()
            .any(|dir| path == dir || path.starts_with(&format!("{dir}/")))
    });

    let mut files = BTreeSet::new();
    let mut dirs = BTreeSet::new();
    for path in selected {
        if is_real_dir(&srcdir.join(&path)) {
            dirs.insert(path);
        } else {
            files.insert(path);
        }
    }

    // Parents of every selected file must exist at the destination.
    for file in &files {
        let mut parent = Path::new(file).parent();
        while let Some(dir) = parent {
            if dir.as_os_str().is_empty() {
                break;
            }
            dirs.insert(dir.to_string_lossy().to_string());
            parent = dir.parent();
        }
    }

    Ok((files, dirs))
}

fn is_real_dir(path: &Path) -> bool {
    path.is_dir() && !path.is_symlink()
}

/// Expand include patterns to the set of paths they select, relative to
/// `srcdir`. Directory matches are expanded recursively.
fn generate_include_set(
    srcdir: &Path,
    includes: &[&str],
) -> Result<BTreeSet<String>, FilesetError> {
    let mut matched = BTreeSet::new();

    for include in includes {
        if include.contains('*') {
            let pattern = srcdir.join(include).to_string_lossy().to_string();
            let paths = glob::glob(&pattern).map_err(|source| FilesetError::Pattern {
                pattern: include.to_string(),
                source,
            })?;
            for path in paths.flatten() {
                if let Ok(relative) = path.strip_prefix(srcdir) {
                    matched.insert(relative.to_string_lossy().to_string());
                }
            }
        } else if srcdir.join(include).exists() || srcdir.join(include).is_symlink() {
            matched.insert(include.to_string());
        }
    }

    let directories: Vec<String> = matched
        .iter()
        .filter(|path| is_real_dir(&srcdir.join(path)))
        .cloned()
        .collect();

    for directory in directories {
        let root = srcdir.join(&directory);
        for entry in walk_tree(&root)? {
            if let Ok(relative) = entry.strip_prefix(srcdir) {
                matched.insert(relative.to_string_lossy().to_string());
            }
        }
    }

    Ok(matched)
}

fn walk_tree(root: &Path) -> Result<Vec<std::path::PathBuf>, FilesetError> {
    let mut paths = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = std::fs::read_dir(&dir).map_err(|source| FilesetError::Scan {
            path: dir.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| FilesetError::Scan {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            paths.push(path.clone());
            if is_real_dir(&path) {
                pending.push(path);
            }
        }
    }
    Ok(paths)
}

#[cfg(test)]
#[path = "fileset_tests.rs"]
mod tests;
