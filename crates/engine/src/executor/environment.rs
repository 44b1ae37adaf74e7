// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step environment generation.
//!
//! Produces the `/bin/sh` preamble shared by build scripts and
//! scriptlets. Later lines shadow earlier ones, so the ordering is part
//! of the contract: core exports, then the plugin's environment (build
//! only), then the user's `build-environment` entries in declared order.

use crate::plugins::Plugin;
use partcraft_core::{Part, Step, StepInfo};
use std::fmt::Write as _;
use std::path::PathBuf;

/// Generate the environment script for running a step of a part.
pub fn generate_step_environment(
    part: &Part,
    plugin: &dyn Plugin,
    step_info: &StepInfo,
) -> String {
    let mut script = String::new();
    script.push_str("#!/bin/sh\n");
    script.push_str("set -e\n");
    script.push_str("# Environment\n");

    script.push_str("## Part Environment\n");
    for (key, value) in part_environment(part) {
        let _ = writeln!(script, "export {key}=\"{value}\"");
    }

    if step_info.step == Step::Build {
        script.push_str("## Plugin Environment\n");
        for (key, value) in plugin.get_build_environment() {
            let _ = writeln!(script, "export {key}=\"{value}\"");
        }
    }

    script.push_str("## User Environment\n");
    for entry in &part.spec.build_environment {
        for (key, value) in entry {
            let _ = writeln!(script, "export {key}=\"{value}\"");
        }
    }

    script
}

/// The built-in part environment: tool and library paths into the
/// install and stage trees.
fn part_environment(part: &Part) -> Vec<(String, String)> {
    let roots = [part.part_install_dir(), part.stage_dir()];
    let mut environment = Vec::new();

    let bin_paths = existing_subdirs(&roots, &["usr/sbin", "usr/bin", "sbin", "bin"]);
    if !bin_paths.is_empty() {
        let mut paths: Vec<String> = bin_paths
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect();
        paths.push("$PATH".to_string());
        environment.push(("PATH".to_string(), paths.join(":")));
    }

    let include_paths = existing_subdirs(&roots, &["include", "usr/include"]);
    if !include_paths.is_empty() {
        let flags = join_prefixed(&include_paths, "-isystem ", " ");
        for variable in ["CPPFLAGS", "CFLAGS", "CXXFLAGS"] {
            environment.push((variable.to_string(), flags.clone()));
        }
    }

    let library_paths = existing_subdirs(&roots, &["lib", "usr/lib"]);
    if !library_paths.is_empty() {
        environment.push(("LDFLAGS".to_string(), join_prefixed(&library_paths, "-L", " ")));
    }

    let pkg_config_paths = existing_subdirs(
        &roots,
        &["lib/pkgconfig", "usr/lib/pkgconfig", "usr/share/pkgconfig"],
    );
    if !pkg_config_paths.is_empty() {
        environment.push((
            "PKG_CONFIG_PATH".to_string(),
            join_prefixed(&pkg_config_paths, "", ":"),
        ));
    }

    environment
}

fn existing_subdirs(roots: &[PathBuf], subdirs: &[&str]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for root in roots {
        for subdir in subdirs {
            let path = root.join(subdir);
            if path.is_dir() {
                found.push(path);
            }
        }
    }
    found
}

fn join_prefixed(paths: &[PathBuf], prefix: &str, separator: &str) -> String {
    paths
        .iter()
        .map(|p| format!("{prefix}{}", p.display()))
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
#[path = "environment_tests.rs"]
mod tests;
