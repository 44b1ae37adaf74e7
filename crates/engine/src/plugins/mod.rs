// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build plugins.
//!
//! A plugin turns a part specification into build commands and the
//! packages those commands need. Plugins are selected by the part's
//! `plugin` key (defaulting to the part name) and consume the
//! `<plugin>-` prefixed properties of the spec.

mod dump;
mod make;
mod nil;

pub use dump::DumpPlugin;
pub use make::MakePlugin;
pub use nil::NilPlugin;

use indexmap::IndexMap;
use partcraft_core::{Part, PartInfo};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin {0:?} is not registered")]
    InvalidPlugin(String),
    #[error("invalid properties for plugin {plugin:?}: {message}")]
    InvalidProperties { plugin: String, message: String },
}

/// Strategy producing the build commands and requirements of a part.
pub trait Plugin: Send + Sync {
    /// Snaps that must be present on the host to build.
    fn get_build_snaps(&self) -> BTreeSet<String>;

    /// OS packages that must be installed on the host to build.
    fn get_build_packages(&self) -> BTreeSet<String>;

    /// Environment entries exported before the build commands.
    fn get_build_environment(&self) -> IndexMap<String, String>;

    /// Shell lines executed, in order, by the synthesized build script.
    fn get_build_commands(&self) -> Vec<String>;
}

/// Resolve the plugin for a part.
pub fn plugin_for_part(part: &Part, part_info: &PartInfo) -> Result<Box<dyn Plugin>, PluginError> {
    match part.plugin_name() {
        "nil" => Ok(Box::new(NilPlugin::new())),
        "dump" => Ok(Box::new(DumpPlugin::new(part_info))),
        "make" => Ok(Box::new(MakePlugin::unmarshal(part, part_info)?)),
        other => Err(PluginError::InvalidPlugin(other.to_string())),
    }
}

/// Parse a plugin-prefixed property into a concrete type.
pub(crate) fn plugin_property<T: serde::de::DeserializeOwned + Default>(
    part: &Part,
    key: &str,
) -> Result<T, PluginError> {
    match part.spec.plugin_properties.get(key) {
        None => Ok(T::default()),
        Some(value) => {
            serde_yaml::from_value(value.clone()).map_err(|err| PluginError::InvalidProperties {
                plugin: part.plugin_name().to_string(),
                message: format!("{key}: {err}"),
            })
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
