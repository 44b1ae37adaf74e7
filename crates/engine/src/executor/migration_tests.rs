// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use partcraft_core::{PartSpec, ProjectDirs};
use std::fs;
use std::os::unix::fs::symlink;

fn write(root: &Path, rel: &str, contents: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn part_with(dir: &Path, name: &str, stage: &[&str]) -> Part {
    let spec = PartSpec {
        plugin: Some("nil".to_string()),
        stage: stage.iter().map(|s| s.to_string()).collect(),
        ..PartSpec::default()
    };
    Part::new(name, spec, &ProjectDirs::new(dir))
}

#[test]
fn migrate_preserves_structure_and_symlinks() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let dst = dir.path().join("dst");
    write(&src, "bin/hello", b"binary");
    fs::create_dir_all(&src).unwrap();
    symlink("bin/hello", src.join("link")).unwrap();

    let files = BTreeSet::from(["bin/hello".to_string(), "link".to_string()]);
    let dirs = BTreeSet::from(["bin".to_string()]);
    migrate_files(&files, &dirs, &src, &dst).unwrap();

    assert_eq!(fs::read(dst.join("bin/hello")).unwrap(), b"binary");
    assert_eq!(
        fs::read_link(dst.join("link")).unwrap().to_string_lossy(),
        "bin/hello"
    );
}

#[test]
fn migrate_leaves_existing_destination_symlinks() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let dst = dir.path().join("dst");
    write(&src, "file", b"new");
    fs::create_dir_all(&dst).unwrap();
    write(&dst, "other", b"target");
    symlink("other", dst.join("file")).unwrap();

    let files = BTreeSet::from(["file".to_string()]);
    migrate_files(&files, &BTreeSet::new(), &src, &dst).unwrap();

    // the symlink was not replaced
    assert!(dst.join("file").is_symlink());
    assert_eq!(fs::read(dst.join("file")).unwrap(), b"target");
}

#[test]
fn prime_sets_default_to_the_stage_fileset() {
    let dir = tempfile::tempdir().unwrap();
    let part = {
        let spec = PartSpec {
            plugin: Some("nil".to_string()),
            stage: vec!["bin".to_string(), "-bin/extra".to_string()],
            ..PartSpec::default()
        };
        Part::new("foo", spec, &ProjectDirs::new(dir.path()))
    };
    write(&part.part_install_dir(), "bin/hello", b"x");
    write(&part.part_install_dir(), "bin/extra", b"x");
    write(&part.part_install_dir(), "share/doc", b"x");

    let (files, _dirs) = prime_migration_sets(&part).unwrap();
    assert!(files.contains("bin/hello"));
    assert!(!files.contains("bin/extra"));
    assert!(!files.contains("share/doc"));
}

#[test]
fn explicit_prime_sets_stand_alone() {
    let dir = tempfile::tempdir().unwrap();
    let part = {
        let spec = PartSpec {
            plugin: Some("nil".to_string()),
            prime: vec!["share".to_string()],
            ..PartSpec::default()
        };
        Part::new("foo", spec, &ProjectDirs::new(dir.path()))
    };
    write(&part.part_install_dir(), "bin/hello", b"x");
    write(&part.part_install_dir(), "share/doc", b"x");

    let (files, _dirs) = prime_migration_sets(&part).unwrap();
    assert_eq!(files.iter().collect::<Vec<_>>(), ["share/doc"]);
}

#[test]
fn identical_staged_files_do_not_collide() {
    let dir = tempfile::tempdir().unwrap();
    let a = part_with(dir.path(), "a", &["*"]);
    let b = part_with(dir.path(), "b", &["*"]);
    write(&a.part_install_dir(), "bin/hello", b"same");
    write(&b.part_install_dir(), "bin/hello", b"same");

    check_stage_collisions(&[a, b]).unwrap();
}

#[test]
fn conflicting_staged_files_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let a = part_with(dir.path(), "a", &["*"]);
    let b = part_with(dir.path(), "b", &["*"]);
    write(&a.part_install_dir(), "bin/hello", b"from a");
    write(&b.part_install_dir(), "bin/hello", b"from b");

    let err = check_stage_collisions(&[a, b]).unwrap_err();
    match err {
        ExecutionError::PartFilesConflict {
            part_name,
            other_part_name,
            conflict_files,
        } => {
            assert_eq!(part_name, "b");
            assert_eq!(other_part_name, "a");
            assert_eq!(conflict_files, ["bin/hello"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn excluding_the_path_resolves_the_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let a = part_with(dir.path(), "a", &["*"]);
    let b = part_with(dir.path(), "b", &["*", "-bin/hello"]);
    write(&a.part_install_dir(), "bin/hello", b"from a");
    write(&b.part_install_dir(), "bin/hello", b"from b");

    check_stage_collisions(&[a, b]).unwrap();
}

#[test]
fn parts_without_install_dirs_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let a = part_with(dir.path(), "a", &["*"]);
    let b = part_with(dir.path(), "b", &["*"]);
    check_stage_collisions(&[a, b]).unwrap();
}
