// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact normalization for unpacked OS packages.
//!
//! Distro packages assume they live under `/`. After unpacking into a
//! part's install directory the artifacts are adjusted to work from
//! there: absolute symlinks are turned into relative ones inside the
//! tree, setuid/setgid bits are stripped, pkg-config prefixes are
//! re-rooted and hard-coded Python shebangs are rewritten to use `env`.

use regex::Regex;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

#[allow(clippy::unwrap_used)] // all patterns are literals
fn literal_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

/// Normalize everything under `unpack_dir`.
pub fn normalize(unpack_dir: &Path) -> io::Result<()> {
    fix_artifacts(unpack_dir)?;
    rewrite_python_shebangs(unpack_dir)?;
    Ok(())
}

fn fix_artifacts(unpack_dir: &Path) -> io::Result<()> {
    for entry in WalkDir::new(unpack_dir).follow_links(false) {
        let entry = entry.map_err(io::Error::other)?;
        let path = entry.path();
        if path == unpack_dir {
            continue;
        }

        if path.is_symlink() {
            let target = fs::read_link(path)?;
            if target.is_absolute() {
                fix_symlink(path, &target, unpack_dir)?;
            }
        } else if entry.file_type().is_file() {
            fix_filemode(path)?;
            if path.extension().is_some_and(|ext| ext == "pc") {
                fix_pkg_config(unpack_dir, path)?;
            }
        } else {
            fix_filemode(path)?;
        }
    }
    Ok(())
}

/// Re-point an absolute symlink into the unpack tree, relative to the
/// link's own directory. Links whose target doesn't exist in the tree
/// are left dangling as-is.
fn fix_symlink(path: &Path, target: &Path, unpack_dir: &Path) -> io::Result<()> {
    let stripped = target
        .components()
        .filter(|c| !matches!(c, Component::RootDir))
        .collect::<PathBuf>();
    let in_tree = unpack_dir.join(&stripped);
    if !in_tree.exists() && !in_tree.is_symlink() {
        tracing::warn!(link = %path.display(), target = %target.display(), "will be a dangling symlink");
        return Ok(());
    }

    let parent = path.parent().unwrap_or(unpack_dir);
    let relative = relative_path(parent, &in_tree);
    fs::remove_file(path)?;
    std::os::unix::fs::symlink(relative, path)?;
    Ok(())
}

/// A relative path from directory `from` to `to`, using `..` segments.
fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..from.len() {
        relative.push("..");
    }
    for component in &to[common..] {
        relative.push(component);
    }
    relative
}

fn fix_filemode(path: &Path) -> io::Result<()> {
    let mode = fs::symlink_metadata(path)?.permissions().mode() & 0o7777;
    if mode & 0o6000 != 0 {
        tracing::warn!(path = %path.display(), "removing suid/sgid bits");
        fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o1777))?;
    }
    Ok(())
}

/// Re-root the `prefix=` line of a pkg-config file into the unpack tree.
pub fn fix_pkg_config(unpack_dir: &Path, pc_file: &Path) -> io::Result<()> {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    let pattern = PREFIX.get_or_init(|| literal_regex(r"(?m)^prefix=(?<rest>.*)$"));

    let Ok(contents) = fs::read_to_string(pc_file) else {
        return Ok(()); // binary or unreadable, leave it alone
    };

    let root = unpack_dir.to_string_lossy();
    let replaced = pattern.replace(&contents, format!("prefix={root}$rest"));
    if replaced != contents {
        fs::write(pc_file, replaced.as_bytes())?;
    }
    Ok(())
}

/// Rewrite `#!/usr/bin/pythonX` shebangs to `#!/usr/bin/env pythonX`.
///
/// `env` cannot pass interpreter arguments, so shebangs that carry them
/// get a `/bin/sh` trampoline that re-executes the file with the
/// original interpreter and arguments.
fn rewrite_python_shebangs(root_dir: &Path) -> io::Result<()> {
    static ARGLESS: OnceLock<Regex> = OnceLock::new();
    static WITH_ARGS: OnceLock<Regex> = OnceLock::new();
    let argless = ARGLESS.get_or_init(|| literal_regex(r"\A#!\S*(?<interp>python\S*)[ \t]*\n"));
    let with_args = WITH_ARGS
        .get_or_init(|| literal_regex(r"\A#!\S*(?<interp>python\S*)[ \t]+(?<args>\S[^\n]*)\n"));

    for entry in WalkDir::new(root_dir).follow_links(false) {
        let entry = entry.map_err(io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        // A symlinked file is either invalid or rewritten through its
        // real path.
        if path.is_symlink() {
            continue;
        }

        let Ok(contents) = fs::read_to_string(path) else {
            continue; // probably binary
        };
        if !contents.starts_with("#!") {
            continue;
        }

        let rewritten = if let Some(caps) = with_args.captures(&contents) {
            let interp = &caps["interp"];
            let args = caps["args"].trim_end();
            let trampoline =
                format!("#!/bin/sh\n''''exec {interp} {args} -- \"$0\" \"$@\" # '''\n");
            with_args.replace(&contents, trampoline).to_string()
        } else if let Some(caps) = argless.captures(&contents) {
            let interp = &caps["interp"];
            argless
                .replace(&contents, format!("#!/usr/bin/env {interp}\n"))
                .to_string()
        } else {
            continue;
        };

        if rewritten != contents {
            fs::write(path, rewritten)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
