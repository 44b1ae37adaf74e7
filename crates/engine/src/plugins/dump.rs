// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dump plugin: copy the part source verbatim.

use super::Plugin;
use indexmap::IndexMap;
use partcraft_core::PartInfo;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Copies the content of the part source into the install directory.
#[derive(Debug, Clone)]
pub struct DumpPlugin {
    install_dir: PathBuf,
}

impl DumpPlugin {
    pub fn new(part_info: &PartInfo) -> Self {
        Self {
            install_dir: part_info.part_install_dir.clone(),
        }
    }
}

impl Plugin for DumpPlugin {
    fn get_build_snaps(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn get_build_packages(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn get_build_environment(&self) -> IndexMap<String, String> {
        IndexMap::new()
    }

    fn get_build_commands(&self) -> Vec<String> {
        vec![format!(
            "cp --archive --link --no-dereference . \"{}\"",
            self.install_dir.display()
        )]
    }
}

#[cfg(test)]
#[path = "dump_tests.rs"]
mod tests;
