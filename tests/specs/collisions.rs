// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Staging collision detection.

use crate::prelude::*;
use partcraft_core::Step;
use partcraft_engine::{ExecutionError, LifecycleError};

fn conflicting_document(project: &Project, contents_a: &str, contents_b: &str) -> String {
    let a = project.upstream("a-upstream", &[("bin/hello", contents_a)]);
    let b = project.upstream("b-upstream", &[("bin/hello", contents_b)]);
    format!(
        "parts:\n\
         \x20 a:\n\
         \x20   plugin: dump\n\
         \x20   source: {}\n\
         \x20 b:\n\
         \x20   plugin: dump\n\
         \x20   source: {}\n",
        a.display(),
        b.display(),
    )
}

#[tokio::test]
async fn conflicting_files_abort_staging_with_nothing_written() {
    let project = Project::new();
    let document = conflicting_document(&project, "from a", "from b");
    let mut manager = project.manager(&document);

    let actions = manager.plan(Step::Stage, &[]).unwrap();
    let mut context = manager.execution_context().await.unwrap();
    let err = context.execute(&actions).await.unwrap_err();

    match err {
        LifecycleError::Execution(ExecutionError::PartFilesConflict {
            part_name,
            other_part_name,
            conflict_files,
        }) => {
            assert_eq!(part_name, "b");
            assert_eq!(other_part_name, "a");
            assert_eq!(conflict_files, ["bin/hello"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // the conflict was detected before any file moved
    assert!(!project.work_dir().join("stage/bin").exists());
}

#[tokio::test]
async fn identical_files_may_be_co_owned() {
    let project = Project::new();
    let document = conflicting_document(&project, "same", "same");
    let mut manager = project.manager(&document);

    project.run_to(&mut manager, Step::Stage).await;

    assert!(project.work_dir().join("stage/bin/hello").is_file());
}

#[tokio::test]
async fn excluding_the_conflicting_path_from_one_part_resolves_it() {
    let project = Project::new();
    let a = project.upstream("a-upstream", &[("bin/hello", "from a")]);
    let b = project.upstream("b-upstream", &[("bin/hello", "from b"), ("bin/other", "ok")]);
    let document = format!(
        "parts:\n\
         \x20 a:\n\
         \x20   plugin: dump\n\
         \x20   source: {}\n\
         \x20 b:\n\
         \x20   plugin: dump\n\
         \x20   source: {}\n\
         \x20   stage: [\"*\", \"-bin/hello\"]\n",
        a.display(),
        b.display(),
    );
    let mut manager = project.manager(&document);

    project.run_to(&mut manager, Step::Stage).await;

    let stage = project.work_dir().join("stage");
    assert_eq!(
        std::fs::read_to_string(stage.join("bin/hello")).unwrap(),
        "from a"
    );
    assert!(stage.join("bin/other").is_file());
}
