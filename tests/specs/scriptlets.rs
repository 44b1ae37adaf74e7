// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User scriptlets and the control channel, through the whole stack.

use crate::prelude::*;
use partcraft_core::Step;
use partcraft_engine::{ExecutionError, LifecycleError};

#[tokio::test]
async fn override_build_replaces_the_plugin_commands() {
    let project = Project::new();
    let upstream = project.upstream("src-upstream", &[("input", "data")]);
    let document = format!(
        "parts:\n\
         \x20 app:\n\
         \x20   plugin: nil\n\
         \x20   source: {}\n\
         \x20   override-build: |\n\
         \x20     mkdir -p \"{}/parts/app/install\"\n\
         \x20     cp input \"{}/parts/app/install/output\"\n",
        upstream.display(),
        project.work_dir().display(),
        project.work_dir().display(),
    );
    let mut manager = project.manager(&document);

    project.run_to(&mut manager, Step::Prime).await;

    let work = project.work_dir();
    assert_eq!(
        std::fs::read_to_string(work.join("parts/app/install/output")).unwrap(),
        "data"
    );
    assert_eq!(std::fs::read_to_string(work.join("prime/output")).unwrap(), "data");
}

#[tokio::test]
async fn scriptlets_can_call_back_into_builtins() {
    let project = Project::new();
    let upstream = project.upstream("src-upstream", &[("artifact", "payload")]);
    // pull via the control API, then add a marker of our own
    let document = format!(
        "parts:\n\
         \x20 app:\n\
         \x20   plugin: dump\n\
         \x20   source: {}\n\
         \x20   override-pull: |\n\
         \x20     echo '{{\"function\": \"pull\", \"args\": []}}' > \"$CRAFT_PARTS_CALL_FIFO\"\n\
         \x20     read -r _ < \"$CRAFT_PARTS_FEEDBACK_FIFO\"\n\
         \x20     echo done > pulled-by-scriptlet\n",
        upstream.display(),
    );
    let mut manager = project.manager(&document);

    project.run_to(&mut manager, Step::Prime).await;

    let work = project.work_dir();
    assert!(work.join("parts/app/src/artifact").is_file());
    assert!(work.join("parts/app/src/pulled-by-scriptlet").is_file());
    assert!(work.join("prime/artifact").is_file());
}

#[tokio::test]
async fn failing_scriptlets_abort_the_run() {
    let project = Project::new();
    let upstream = project.upstream("src-upstream", &[("input", "data")]);
    let document = format!(
        "parts:\n\
         \x20 app:\n\
         \x20   plugin: dump\n\
         \x20   source: {}\n\
         \x20   override-build: |\n\
         \x20     exit 42\n",
        upstream.display(),
    );
    let mut manager = project.manager(&document);

    let actions = manager.plan(Step::Prime, &[]).unwrap();
    let mut context = manager.execution_context().await.unwrap();
    let err = context.execute(&actions).await.unwrap_err();

    match err {
        LifecycleError::Execution(ExecutionError::ScriptletRun {
            scriptlet_name,
            code,
        }) => {
            assert_eq!(scriptlet_name, "override-build");
            assert_eq!(code, 42);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // no state was written for the failed step
    let work = project.work_dir();
    assert!(work.join("parts/app/state/pull").is_file());
    assert!(!work.join("parts/app/state/build").exists());
}
