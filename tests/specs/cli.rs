// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box CLI behavior: invokes the partcraft binary.

use crate::prelude::*;
use assert_cmd::Command;
use std::fs;

fn project_with_document() -> Project {
    let project = Project::new();
    let upstream = project.upstream("content-upstream", &[("bin/hello", "hi")]);
    let document = format!(
        "parts:\n  content:\n    plugin: dump\n    source: {}\n",
        upstream.display()
    );
    fs::write(project.work_dir().join("parts.yaml"), document).unwrap();
    project
}

fn partcraft_bin_path() -> std::path::PathBuf {
    static BIN_PATH: std::sync::OnceLock<std::path::PathBuf> = std::sync::OnceLock::new();
    BIN_PATH
        .get_or_init(|| {
            if let Ok(path) = std::env::var("CARGO_BIN_EXE_partcraft") {
                return path.into();
            }
            let status = std::process::Command::new(env!("CARGO"))
                .args(["build", "-p", "partcraft", "--bin", "partcraft"])
                .status()
                .expect("failed to build partcraft binary");
            assert!(status.success(), "failed to build partcraft binary");
            let mut path = std::env::current_exe().unwrap();
            path.pop();
            if path.ends_with("deps") {
                path.pop();
            }
            path.push("partcraft");
            path
        })
        .clone()
}

fn partcraft(project: &Project) -> Command {
    let mut cmd = Command::new(partcraft_bin_path());
    cmd.current_dir(project.work_dir());
    cmd
}

#[test]
fn version_flag_prints_and_exits() {
    let project = project_with_document();
    let output = partcraft(&project).arg("--version").assert().success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).to_string();
    assert!(stdout.contains("partcraft"), "got: {stdout}");
}

#[test]
fn plan_only_lists_pending_actions_without_executing() {
    let project = project_with_document();

    let output = partcraft(&project)
        .args(["prime", "--plan-only"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout).to_string();
    assert!(stdout.contains("Pull content"), "got: {stdout}");
    assert!(stdout.contains("Prime content"), "got: {stdout}");
    assert!(!project.work_dir().join("prime").exists());
}

#[test]
fn prime_executes_the_whole_lifecycle() {
    let project = project_with_document();

    let output = partcraft(&project).assert().success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).to_string();
    assert!(stdout.contains("Execute: Pull content"), "got: {stdout}");

    assert!(project.work_dir().join("prime/bin/hello").is_file());

    // a second run has nothing to do
    let output = partcraft(&project)
        .args(["prime", "--plan-only"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).to_string();
    assert!(stdout.contains("No actions to execute."), "got: {stdout}");
}

#[test]
fn show_skipped_reveals_settled_steps() {
    let project = project_with_document();
    partcraft(&project).assert().success();

    let output = partcraft(&project)
        .args(["prime", "--plan-only", "--show-skipped"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).to_string();
    assert!(
        stdout.contains("Skip pull content (already ran)"),
        "got: {stdout}"
    );
}

#[test]
fn clean_subcommand_resets_the_work_tree() {
    let project = project_with_document();
    partcraft(&project).assert().success();
    assert!(project.work_dir().join("prime").exists());

    let output = partcraft(&project).arg("clean").assert().success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).to_string();
    assert!(stdout.contains("Clean all parts."), "got: {stdout}");
    assert!(!project.work_dir().join("prime").exists());
    assert!(!project.work_dir().join("parts").exists());
}

#[test]
fn missing_document_is_a_user_facing_error() {
    let project = Project::new();

    let output = partcraft(&project).arg("prime").assert().failure().code(1);
    let stderr = String::from_utf8_lossy(&output.get_output().stderr).to_string();
    assert!(stderr.contains("Error:"), "got: {stderr}");
}

#[test]
fn unknown_part_name_is_a_user_facing_error() {
    let project = project_with_document();

    let output = partcraft(&project)
        .args(["build", "ghost"])
        .assert()
        .failure()
        .code(1);
    let stderr = String::from_utf8_lossy(&output.get_output().stderr).to_string();
    assert!(stderr.contains("ghost"), "got: {stderr}");
}
