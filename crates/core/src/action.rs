// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Planned lifecycle actions.

use crate::step::Step;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a step should be executed (or not).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// Run the step for the first time.
    Run,
    /// Clean the step and run it again.
    Rerun,
    /// Nothing to do, the step is up to date.
    Skip,
    /// Refresh the step in place without cleaning.
    Update,
}

/// A single entry in the plan produced by the sequencer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub part_name: String,
    pub step: Step,
    pub action_type: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Action {
    pub fn new(
        part_name: impl Into<String>,
        step: Step,
        action_type: ActionType,
        reason: Option<String>,
    ) -> Self {
        Self {
            part_name: part_name.into(),
            step,
            action_type,
            reason,
        }
    }

    /// The progress line shown to the user for this action.
    pub fn message(&self) -> String {
        let verb = match (self.step, self.action_type) {
            (Step::Pull, ActionType::Run) => "Pull",
            (Step::Pull, ActionType::Rerun) => "Repull",
            (Step::Pull, ActionType::Skip) => "Skip pull",
            (Step::Pull, ActionType::Update) => "Update sources for",
            (Step::Build, ActionType::Run) => "Build",
            (Step::Build, ActionType::Rerun) => "Rebuild",
            (Step::Build, ActionType::Skip) => "Skip build",
            (Step::Build, ActionType::Update) => "Update build for",
            (Step::Stage, ActionType::Run) => "Stage",
            (Step::Stage, ActionType::Rerun) => "Restage",
            (Step::Stage, ActionType::Skip) => "Skip stage",
            (Step::Stage, ActionType::Update) => "Update stage for",
            (Step::Prime, ActionType::Run) => "Prime",
            (Step::Prime, ActionType::Rerun) => "Re-prime",
            (Step::Prime, ActionType::Skip) => "Skip prime",
            (Step::Prime, ActionType::Update) => "Update prime for",
        };

        match &self.reason {
            Some(reason) => format!("{verb} {} ({reason})", self.part_name),
            None => format!("{verb} {}", self.part_name),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
