// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::Step;

#[test]
fn lifecycle_order() {
    assert!(Step::Pull < Step::Build);
    assert!(Step::Build < Step::Stage);
    assert!(Step::Stage < Step::Prime);
}

#[yare::parameterized(
    pull  = { Step::Pull,  &[] },
    build = { Step::Build, &[Step::Pull] },
    stage = { Step::Stage, &[Step::Pull, Step::Build] },
    prime = { Step::Prime, &[Step::Pull, Step::Build, Step::Stage] },
)]
fn previous_steps(step: Step, expected: &[Step]) {
    assert_eq!(step.previous_steps(), expected);
}

#[yare::parameterized(
    pull  = { Step::Pull,  &[Step::Build, Step::Stage, Step::Prime] },
    build = { Step::Build, &[Step::Stage, Step::Prime] },
    stage = { Step::Stage, &[Step::Prime] },
    prime = { Step::Prime, &[] },
)]
fn next_steps(step: Step, expected: &[Step]) {
    assert_eq!(step.next_steps(), expected);
}

#[yare::parameterized(
    pull  = { Step::Pull,  None },
    build = { Step::Build, None },
    stage = { Step::Stage, Some(Step::Stage) },
    prime = { Step::Prime, Some(Step::Stage) },
)]
fn dependency_prerequisite(step: Step, expected: Option<Step>) {
    assert_eq!(step.dependency_prerequisite_step(), expected);
}

#[test]
fn parse_round_trip() {
    for step in Step::ALL {
        assert_eq!(step.name().parse::<Step>().unwrap(), step);
    }
    assert!("deploy".parse::<Step>().is_err());
}
