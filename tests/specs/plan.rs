// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Planning semantics across runs.

use crate::prelude::*;
use partcraft_core::{ActionType, Step};
use similar_asserts::assert_eq;

fn two_part_document(project: &Project) -> String {
    let lib = project.upstream("lib-upstream", &[("lib/liblib.a", "lib")]);
    let app = project.upstream("app-upstream", &[("bin/app", "app")]);
    format!(
        "parts:\n\
         \x20 app:\n\
         \x20   plugin: dump\n\
         \x20   source: {}\n\
         \x20   after: [lib]\n\
         \x20 lib:\n\
         \x20   plugin: dump\n\
         \x20   source: {}\n",
        app.display(),
        lib.display(),
    )
}

#[tokio::test]
async fn fresh_plan_runs_every_step_in_dependency_order() {
    let project = Project::new();
    let document = two_part_document(&project);
    let mut manager = project.manager(&document);

    let actions = manager.plan(Step::Prime, &[]).unwrap();

    assert_eq!(
        brief(&actions),
        [
            "Run lib:pull",
            "Run app:pull",
            "Run lib:build",
            "Run app:build",
            "Run lib:stage",
            "Run app:stage",
            "Run lib:prime",
            "Run app:prime",
        ]
    );
}

#[tokio::test]
async fn replanning_after_execution_skips_everything() {
    let project = Project::new();
    let document = two_part_document(&project);
    let mut manager = project.manager(&document);
    project.run_to(&mut manager, Step::Prime).await;

    let replan = manager.plan(Step::Prime, &[]).unwrap();

    assert_eq!(replan.len(), 8);
    assert!(all_skips(&replan));
    assert!(replan
        .iter()
        .all(|a| a.reason.as_deref() == Some("already ran")));
}

#[tokio::test]
async fn changing_a_pull_property_replans_from_pull() {
    let project = Project::new();
    let document = two_part_document(&project);
    let mut manager = project.manager(&document);
    project.run_to(&mut manager, Step::Prime).await;

    // app's source moves somewhere else; lib is untouched
    let moved = project.upstream("app-moved", &[("bin/app", "app")]);
    let document = document.replace("app-upstream", "app-moved");
    drop(manager);
    let mut manager = project.manager(&document);

    let actions = manager.plan(Step::Prime, &[]).unwrap();

    assert_eq!(
        brief(&actions),
        [
            "Skip lib:pull",
            "Rerun app:pull",
            "Skip lib:build",
            "Run app:build",
            "Skip lib:stage",
            "Run app:stage",
            "Skip lib:prime",
            "Run app:prime",
        ]
    );
    assert_eq!(
        actions[1].reason.as_deref(),
        Some("\"source\" property changed")
    );
    assert!(moved.exists());
}

#[tokio::test]
async fn requesting_a_step_for_a_part_reruns_exactly_that_step() {
    let project = Project::new();
    let document = two_part_document(&project);
    let mut manager = project.manager(&document);
    project.run_to(&mut manager, Step::Prime).await;

    let actions = manager.plan(Step::Build, &["lib".to_string()]).unwrap();

    assert_eq!(brief(&actions), ["Skip lib:pull", "Rerun lib:build"]);
    assert_eq!(actions[1].reason.as_deref(), Some("requested step"));
}

#[tokio::test]
async fn restaged_dependencies_dirty_their_dependents() {
    let project = Project::new();
    let document = two_part_document(&project);
    let mut manager = project.manager(&document);
    project.run_to(&mut manager, Step::Prime).await;

    // rerun lib's stage; app must restage and reprime
    let actions = manager.plan(Step::Stage, &["lib".to_string()]).unwrap();
    let mut context = manager.execution_context().await.unwrap();
    context.execute(&actions).await.unwrap();
    context.finish().await.unwrap();

    let replan = manager.plan(Step::Prime, &[]).unwrap();
    let interesting: Vec<String> = replan
        .iter()
        .filter(|a| a.action_type != ActionType::Skip)
        .map(|a| format!("{:?} {}:{}", a.action_type, a.part_name, a.step))
        .collect();

    assert!(
        interesting.contains(&"Rerun app:stage".to_string()),
        "got: {interesting:?}"
    );
    assert_eq!(
        replan
            .iter()
            .find(|a| a.part_name == "app" && a.step == Step::Stage)
            .and_then(|a| a.reason.as_deref()),
        Some("\"lib\" dependency changed")
    );
}

#[tokio::test]
async fn outdated_source_is_updated_in_place() {
    let project = Project::new();
    let upstream = project.upstream("solo-upstream", &[("file", "v1")]);
    let document = format!("parts:\n  solo:\n    plugin: dump\n    source: {}\n", upstream.display());
    let mut manager = project.manager(&document);
    project.run_to(&mut manager, Step::Prime).await;

    // upstream changes after the pull
    std::fs::write(upstream.join("extra"), "v2").unwrap();
    drop(manager);
    let mut manager = project.manager(&document);

    let actions = manager.plan(Step::Prime, &[]).unwrap();

    assert_eq!(
        brief(&actions),
        [
            "Update solo:pull",
            "Update solo:build",
            "Rerun solo:stage",
            "Run solo:prime",
        ]
    );
    assert_eq!(actions[0].reason.as_deref(), Some("source changed"));
}
