// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end execution against real work trees.

use crate::prelude::*;
use partcraft_core::Step;

#[tokio::test]
async fn primed_tree_contains_the_staged_selection() {
    let project = Project::new();
    let upstream = project.upstream(
        "content-upstream",
        &[("bin/hello", "#!/bin/sh\necho hello\n"), ("doc/README", "docs")],
    );
    let document = format!(
        "parts:\n\
         \x20 content:\n\
         \x20   plugin: dump\n\
         \x20   source: {}\n\
         \x20   stage: [\"bin\"]\n",
        upstream.display()
    );
    let mut manager = project.manager(&document);

    project.run_to(&mut manager, Step::Prime).await;

    let work = project.work_dir();
    assert!(work.join("parts/content/src/bin/hello").is_file());
    assert!(work.join("parts/content/install/bin/hello").is_file());
    assert!(work.join("stage/bin/hello").is_file());
    assert!(!work.join("stage/doc").exists());
    assert!(work.join("prime/bin/hello").is_file());
    assert!(!work.join("prime/doc").exists());

    // every step left a state record
    for step in ["pull", "build", "stage", "prime"] {
        assert!(
            work.join("parts/content/state").join(step).is_file(),
            "missing state for {step}"
        );
    }
}

#[tokio::test]
async fn dependency_artifacts_are_visible_while_staging() {
    let project = Project::new();
    let lib = project.upstream("lib-upstream", &[("usr/lib/libdep.a", "archive")]);
    let app = project.upstream("app-upstream", &[("bin/app", "app")]);
    let document = format!(
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
    );
    let mut manager = project.manager(&document);

    project.run_to(&mut manager, Step::Prime).await;

    let work = project.work_dir();
    assert!(work.join("stage/usr/lib/libdep.a").is_file());
    assert!(work.join("prime/bin/app").is_file());
    assert!(work.join("prime/usr/lib/libdep.a").is_file());
}

#[tokio::test]
async fn executing_an_update_refreshes_the_source_in_place() {
    let project = Project::new();
    let upstream = project.upstream("solo-upstream", &[("file", "v1")]);
    let document = format!(
        "parts:\n  solo:\n    plugin: dump\n    source: {}\n",
        upstream.display()
    );
    let mut manager = project.manager(&document);
    project.run_to(&mut manager, Step::Prime).await;

    std::fs::write(upstream.join("file"), "v2").unwrap();
    drop(manager);
    let mut manager = project.manager(&document);

    let actions = project.run_to(&mut manager, Step::Prime).await;
    assert_eq!(actions[0].message(), "Update sources for solo (source changed)");

    let work = project.work_dir();
    assert_eq!(
        std::fs::read_to_string(work.join("parts/solo/src/file")).unwrap(),
        "v2"
    );
    assert_eq!(
        std::fs::read_to_string(work.join("prime/file")).unwrap(),
        "v2"
    );

    // the refreshed tree settles: nothing to do on the next plan
    drop(manager);
    let mut manager = project.manager(&document);
    assert!(all_skips(&manager.plan(Step::Prime, &[]).unwrap()));
}

#[tokio::test]
async fn clean_with_parts_removes_only_their_work() {
    let project = Project::new();
    let lib = project.upstream("lib-upstream", &[("lib/a", "a")]);
    let app = project.upstream("app-upstream", &[("bin/b", "b")]);
    let document = format!(
        "parts:\n\
         \x20 app:\n\
         \x20   plugin: dump\n\
         \x20   source: {}\n\
         \x20 lib:\n\
         \x20   plugin: dump\n\
         \x20   source: {}\n",
        app.display(),
        lib.display(),
    );
    let mut manager = project.manager(&document);
    project.run_to(&mut manager, Step::Prime).await;

    manager.clean(None, &["lib".to_string()]).unwrap();

    let work = project.work_dir();
    assert!(!work.join("parts/lib/src").exists());
    assert!(!work.join("parts/lib/state/pull").exists());
    assert!(!work.join("stage/lib/a").exists());
    // app's work survives
    assert!(work.join("parts/app/src/bin/b").is_file());
    assert!(work.join("stage/bin/b").is_file());

    // only lib needs to run again
    let replan = manager.plan(Step::Prime, &[]).unwrap();
    let pending: Vec<String> = replan
        .iter()
        .filter(|a| a.action_type != partcraft_core::ActionType::Skip)
        .map(|a| a.part_name.clone())
        .collect();
    assert!(pending.contains(&"lib".to_string()));
    assert!(!pending.contains(&"app".to_string()));
}

#[tokio::test]
async fn stage_packages_flow_through_the_repository_adapter() {
    use partcraft_adapters::{FakeRepository, RepositoryCall};
    use partcraft_engine::{LifecycleManager, ManagerConfig};

    let project = Project::new();
    let upstream = project.upstream("app-upstream", &[("bin/app", "app")]);
    let document = format!(
        "parts:\n\
         \x20 app:\n\
         \x20   plugin: dump\n\
         \x20   source: {}\n\
         \x20   stage-packages: [libpayload]\n",
        upstream.display()
    );

    let repository = FakeRepository::new()
        .with_version("libpayload", "2.1")
        .with_package_file("libpayload", "usr/lib/libpayload.so", b"elf");
    let config = ManagerConfig {
        work_dir: project.work_dir().to_path_buf(),
        ..ManagerConfig::default()
    };
    let mut manager =
        LifecycleManager::with_repository(&document, config, std::sync::Arc::new(repository.clone()))
            .unwrap();

    project.run_to(&mut manager, Step::Prime).await;

    // the package landed in the install tree and was primed with the rest
    let work = project.work_dir();
    assert!(work.join("parts/app/install/usr/lib/libpayload.so").is_file());
    assert!(work.join("prime/usr/lib/libpayload.so").is_file());

    // the resolved version is recorded in the pull state
    let part = manager
        .part_list()
        .iter()
        .find(|p| p.name == "app")
        .unwrap()
        .clone();
    let (state, _) = partcraft_state::read_state(
        Step::Pull,
        &partcraft_state::state_file_path(&part, Step::Pull),
    )
    .unwrap()
    .unwrap();
    let packages = state.assets().unwrap().get("stage-packages").unwrap();
    assert_eq!(
        serde_yaml::to_string(packages).unwrap().trim(),
        "- libpayload=2.1"
    );

    assert!(repository
        .calls()
        .iter()
        .any(|call| matches!(call, RepositoryCall::FetchStagePackages { names } if names == &["libpayload".to_string()])));
}

#[tokio::test]
async fn clean_everything_removes_the_shared_trees() {
    let project = Project::new();
    let upstream = project.upstream("solo-upstream", &[("file", "x")]);
    let document = format!(
        "parts:\n  solo:\n    plugin: dump\n    source: {}\n",
        upstream.display()
    );
    let mut manager = project.manager(&document);
    project.run_to(&mut manager, Step::Prime).await;

    manager.clean(None, &[]).unwrap();

    let work = project.work_dir();
    assert!(!work.join("parts").exists());
    assert!(!work.join("stage").exists());
    assert!(!work.join("prime").exists());
}
