// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File migration between step directories and the staging collision
//! check.

use crate::error::ExecutionError;
use partcraft_adapters::fs_utils;
use partcraft_core::{migratable_filesets, Fileset, Part};
use std::collections::BTreeSet;
use std::path::Path;

/// Files and directories selected for migration, relative to the source
/// step directory.
pub type MigrationSets = (BTreeSet<String>, BTreeSet<String>);

/// What the stage step of a part would migrate out of its install
/// directory.
pub fn stage_migration_sets(part: &Part) -> Result<MigrationSets, ExecutionError> {
    let fileset = Fileset::new("stage", &part.spec.stage);
    Ok(migratable_filesets(&fileset, &part.part_install_dir())?)
}

/// What the prime step of a part would migrate.
///
/// Without an explicit prime file list the stage fileset is folded in,
/// so priming defaults to everything that was staged. Membership is
/// always computed against the install directory.
pub fn prime_migration_sets(part: &Part) -> Result<MigrationSets, ExecutionError> {
    let mut fileset = Fileset::new("prime", &part.spec.prime);
    let has_includes = fileset.entries().iter().any(|e| !e.starts_with('-'));
    if fileset.is_catchall() || !has_includes {
        fileset.combine(&Fileset::new("stage", &part.spec.stage));
    }
    Ok(migratable_filesets(&fileset, &part.part_install_dir())?)
}

/// Migrate the selected files and directories from `srcdir` to
/// `destdir`.
///
/// Directories are created first, with the source's permission bits.
/// A destination file that is already a symlink is left alone; other
/// existing files are replaced by a hard link (or copy) of the source.
pub fn migrate_files(
    files: &BTreeSet<String>,
    dirs: &BTreeSet<String>,
    srcdir: &Path,
    destdir: &Path,
) -> Result<(), ExecutionError> {
    for dirname in dirs {
        let src = srcdir.join(dirname);
        let dst = destdir.join(dirname);
        fs_utils::create_similar_directory(&src, &dst)
            .map_err(ExecutionError::io(format!("creating directory {dst:?}")))?;
    }

    for filename in files {
        let src = srcdir.join(filename);
        let dst = destdir.join(filename);

        if dst.is_symlink() {
            continue;
        }

        fs_utils::link_or_copy(&src, &dst)
            .map_err(ExecutionError::io(format!("migrating {src:?}")))?;
    }

    Ok(())
}

/// Verify that no two parts stage the same path with different content.
///
/// Two parts may share a staged file only when the file contents are
/// identical (symlinks: identical targets). The check runs before any
/// file is moved, so a conflict leaves the stage directory untouched.
pub fn check_stage_collisions(parts: &[Part]) -> Result<(), ExecutionError> {
    let mut seen: Vec<(&Part, MigrationSets)> = Vec::new();

    for part in parts {
        if !part.part_install_dir().is_dir() {
            continue;
        }
        let sets = stage_migration_sets(part)?;

        for (other, (other_files, _)) in &seen {
            let conflicts: Vec<String> = sets
                .0
                .intersection(other_files)
                .filter(|path| {
                    files_differ(
                        &part.part_install_dir().join(path.as_str()),
                        &other.part_install_dir().join(path.as_str()),
                    )
                })
                .cloned()
                .collect();

            if !conflicts.is_empty() {
                return Err(ExecutionError::PartFilesConflict {
                    part_name: part.name.clone(),
                    other_part_name: other.name.clone(),
                    conflict_files: conflicts,
                });
            }
        }

        seen.push((part, sets));
    }

    Ok(())
}

fn files_differ(a: &Path, b: &Path) -> bool {
    if a.is_symlink() || b.is_symlink() {
        let target_a = std::fs::read_link(a).ok();
        let target_b = std::fs::read_link(b).ok();
        return target_a != target_b;
    }

    let hash_a = fs_utils::calculate_hash(a, "sha256").ok().flatten();
    let hash_b = fs_utils::calculate_hash(b, "sha256").ok().flatten();
    match (hash_a, hash_b) {
        (Some(a), Some(b)) => a != b,
        // An unreadable side counts as a difference, the conflict
        // message is more useful than a later migration error.
        _ => true,
    }
}

#[cfg(test)]
#[path = "migration_tests.rs"]
mod tests;
