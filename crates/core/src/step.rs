// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle step ordinals.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four ordered lifecycle steps a part goes through.
///
/// The derived `Ord` follows the lifecycle order:
/// `Pull < Build < Stage < Prime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Pull,
    Build,
    Stage,
    Prime,
}

impl Step {
    /// All steps, in lifecycle order.
    pub const ALL: [Step; 4] = [Step::Pull, Step::Build, Step::Stage, Step::Prime];

    /// The steps that come before this one, in lifecycle order.
    pub fn previous_steps(self) -> &'static [Step] {
        match self {
            Step::Pull => &[],
            Step::Build => &[Step::Pull],
            Step::Stage => &[Step::Pull, Step::Build],
            Step::Prime => &[Step::Pull, Step::Build, Step::Stage],
        }
    }

    /// The steps that come after this one, in lifecycle order.
    pub fn next_steps(self) -> &'static [Step] {
        match self {
            Step::Pull => &[Step::Build, Step::Stage, Step::Prime],
            Step::Build => &[Step::Stage, Step::Prime],
            Step::Stage => &[Step::Prime],
            Step::Prime => &[],
        }
    }

    /// The step a dependency must have reached before a dependent part can
    /// run this step.
    ///
    /// Dependencies are consumed from the stage directory, so a dependent
    /// part can only stage or prime once its dependencies are staged. Pull
    /// and build have no cross-part prerequisite.
    pub fn dependency_prerequisite_step(self) -> Option<Step> {
        match self {
            Step::Pull | Step::Build => None,
            Step::Stage | Step::Prime => Some(Step::Stage),
        }
    }

    /// Lowercase step name, as used in state file names and the CLI.
    pub fn name(self) -> &'static str {
        match self {
            Step::Pull => "pull",
            Step::Build => "build",
            Step::Stage => "stage",
            Step::Prime => "prime",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pull" => Ok(Step::Pull),
            "build" => Ok(Step::Build),
            "stage" => Ok(Step::Stage),
            "prime" => Ok(Step::Prime),
            other => Err(format!("unknown step name: {other:?}")),
        }
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
