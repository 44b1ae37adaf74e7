// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::fs;

fn fileset(entries: &[&str]) -> Fileset {
    let entries: Vec<String> = entries.iter().map(|s| s.to_string()).collect();
    Fileset::new("stage", &entries)
}

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"").unwrap();
}

#[test]
fn includes_default_to_everything() {
    let fs = fileset(&[]);
    assert_eq!(fs.includes(), ["*"]);
    assert!(fs.excludes().is_empty());
    assert!(fs.is_catchall());
}

#[test]
fn excludes_strip_the_dash() {
    let fs = fileset(&["bin", "-usr/share/doc"]);
    assert_eq!(fs.includes(), ["bin"]);
    assert_eq!(fs.excludes(), ["usr/share/doc"]);
    assert!(!fs.is_catchall());
}

#[test]
fn combine_replaces_the_catchall() {
    let mut prime = fileset(&["*"]);
    let stage = fileset(&["bin", "-usr/share/doc"]);
    prime.combine(&stage);
    assert_eq!(prime.entries(), ["bin", "-usr/share/doc"]);
}

#[test]
fn combine_keeps_own_excludes() {
    let mut prime = fileset(&["*", "-etc"]);
    let stage = fileset(&["bin"]);
    prime.combine(&stage);
    assert_eq!(prime.entries(), ["-etc", "bin"]);
}

#[test]
fn migratable_selects_everything_by_default() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("bin/hello"));
    touch(&dir.path().join("share/readme"));

    let (files, dirs) = migratable_filesets(&fileset(&["*"]), dir.path()).unwrap();
    assert_eq!(
        files.iter().collect::<Vec<_>>(),
        ["bin/hello", "share/readme"]
    );
    assert_eq!(dirs.iter().collect::<Vec<_>>(), ["bin", "share"]);
}

#[test]
fn migratable_honors_excludes() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("bin/hello"));
    touch(&dir.path().join("usr/share/doc/readme"));
    touch(&dir.path().join("usr/lib/libfoo.so"));

    let (files, dirs) =
        migratable_filesets(&fileset(&["*", "-usr/share/doc"]), dir.path()).unwrap();
    assert!(files.contains("bin/hello"));
    assert!(files.contains("usr/lib/libfoo.so"));
    assert!(!files.contains("usr/share/doc/readme"));
    assert!(dirs.contains("usr/lib"));
    assert!(!dirs.contains("usr/share/doc"));
}

#[test]
fn migratable_expands_included_directories() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("bin/nested/deep"));
    touch(&dir.path().join("other/file"));

    let (files, dirs) = migratable_filesets(&fileset(&["bin"]), dir.path()).unwrap();
    assert_eq!(files.iter().collect::<Vec<_>>(), ["bin/nested/deep"]);
    assert!(dirs.contains("bin"));
    assert!(dirs.contains("bin/nested"));
    assert!(!files.contains("other/file"));
}

#[test]
fn migratable_includes_parents_of_glob_matches() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("usr/bin/tool"));

    let (files, dirs) =
        migratable_filesets(&fileset(&["usr/bin/*"]), dir.path()).unwrap();
    assert!(files.contains("usr/bin/tool"));
    assert!(dirs.contains("usr"));
    assert!(dirs.contains("usr/bin"));
}

#[test]
fn symlinks_are_files() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("real/file"));
    std::os::unix::fs::symlink("real", dir.path().join("link")).unwrap();

    let (files, dirs) = migratable_filesets(&fileset(&["*"]), dir.path()).unwrap();
    assert!(files.contains("link"));
    assert!(!dirs.contains("link"));
}

#[test]
fn absolute_entries_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = migratable_filesets(&fileset(&["/etc"]), dir.path()).unwrap_err();
    assert!(matches!(err, FilesetError::AbsolutePath { .. }));
}
