// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem helpers shared by source handlers and file migration.

use sha2::{Digest, Sha256, Sha384, Sha512};
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Hard-link `src` to `dst`, copying instead when linking fails (e.g.
/// across filesystems). Symlinks are recreated with their target text
/// unchanged. An existing destination file is replaced.
pub fn link_or_copy(src: &Path, dst: &Path) -> io::Result<()> {
    if dst.is_symlink() || dst.exists() {
        fs::remove_file(dst)?;
    }

    if src.is_symlink() {
        let target = fs::read_link(src)?;
        std::os::unix::fs::symlink(target, dst)?;
        return Ok(());
    }

    if fs::hard_link(src, dst).is_err() {
        fs::copy(src, dst)?;
    }
    Ok(())
}

/// Create `dst` as a directory with the permission bits of `src`.
pub fn create_similar_directory(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    let mode = fs::symlink_metadata(src)?.permissions().mode();
    fs::set_permissions(dst, fs::Permissions::from_mode(mode))?;
    Ok(())
}

/// Recursively mirror `src` into `dst` using hard links where possible.
///
/// Entries named in `ignore` are skipped at the top level only.
pub fn link_or_copy_tree(src: &Path, dst: &Path, ignore: &[&str]) -> io::Result<()> {
    link_tree_inner(src, dst, ignore, true)
}

fn link_tree_inner(src: &Path, dst: &Path, ignore: &[&str], top: bool) -> io::Result<()> {
    create_similar_directory(src, dst)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let name = entry.file_name();
        if top && ignore.iter().any(|i| name.to_string_lossy() == *i) {
            continue;
        }

        let src_path = entry.path();
        let dst_path = dst.join(&name);
        if src_path.is_dir() && !src_path.is_symlink() {
            link_tree_inner(&src_path, &dst_path, ignore, false)?;
        } else {
            link_or_copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Hex digest of a file's contents with the named algorithm.
///
/// Supported algorithms: `sha256`, `sha384`, `sha512`.
pub fn calculate_hash(path: &Path, algorithm: &str) -> io::Result<Option<String>> {
    let contents = fs::read(path)?;
    let digest = match algorithm {
        "sha256" => hex_digest(Sha256::new(), &contents),
        "sha384" => hex_digest(Sha384::new(), &contents),
        "sha512" => hex_digest(Sha512::new(), &contents),
        _ => return Ok(None),
    };
    Ok(Some(digest))
}

fn hex_digest<D: Digest>(mut hasher: D, contents: &[u8]) -> String {
    hasher.update(contents);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
#[path = "fs_utils_tests.rs"]
mod tests;
