// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The make plugin.
//!
//! Runs `make` followed by `make install` with `DESTDIR` pointed at the
//! part's install directory. Extra arguments can be passed through the
//! `make-parameters` property.

use super::{plugin_property, Plugin, PluginError};
use indexmap::IndexMap;
use partcraft_core::{Part, PartInfo};
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct MakePlugin {
    make_parameters: Vec<String>,
    parallel_build_count: usize,
    install_dir: PathBuf,
}

impl MakePlugin {
    pub fn unmarshal(part: &Part, part_info: &PartInfo) -> Result<Self, PluginError> {
        Ok(Self {
            make_parameters: plugin_property(part, "make-parameters")?,
            parallel_build_count: part_info.parallel_build_count,
            install_dir: part_info.part_install_dir.clone(),
        })
    }

    fn make_command(&self, target: Option<&str>) -> String {
        let mut command = vec![
            "make".to_string(),
            format!("-j\"{}\"", self.parallel_build_count),
        ];
        if let Some(target) = target {
            command.push(target.to_string());
        }
        command.extend(self.make_parameters.iter().cloned());
        command.join(" ")
    }
}

impl Plugin for MakePlugin {
    fn get_build_snaps(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn get_build_packages(&self) -> BTreeSet<String> {
        ["gcc", "make"].iter().map(|s| s.to_string()).collect()
    }

    fn get_build_environment(&self) -> IndexMap<String, String> {
        IndexMap::new()
    }

    fn get_build_commands(&self) -> Vec<String> {
        vec![
            self.make_command(None),
            format!(
                "{} DESTDIR=\"{}\"",
                self.make_command(Some("install")),
                self.install_dir.display()
            ),
        ]
    }
}

#[cfg(test)]
#[path = "make_tests.rs"]
mod tests;
