// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The nil plugin: a part with no build at all.
//!
//! Useful for parts that only pull sources or only declare packages.

use super::Plugin;
use indexmap::IndexMap;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, Default)]
pub struct NilPlugin;

impl NilPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for NilPlugin {
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
        Vec::new()
    }
}

#[cfg(test)]
#[path = "nil_tests.rs"]
mod tests;
