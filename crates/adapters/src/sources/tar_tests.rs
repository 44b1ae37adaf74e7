// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::checksum::ChecksumError;
use crate::fs_utils;

async fn make_archive(root: &Path, dir_name: &str) -> PathBuf {
    let tree = root.join(dir_name);
    fs::create_dir_all(tree.join("src")).unwrap();
    fs::write(tree.join("Makefile"), b"all:\n").unwrap();
    fs::write(tree.join("src/main.c"), b"int main(){}\n").unwrap();

    let archive = root.join("source.tar");
    let mut cmd = Command::new("tar");
    cmd.arg("-cf").arg(&archive).arg("-C").arg(root).arg(dir_name);
    subprocess::run_checked(cmd, subprocess::TAR_TIMEOUT, "tar creation")
        .await
        .unwrap();
    archive
}

fn tar_source(archive: PathBuf, source_dir: PathBuf, checksum: Option<String>) -> TarSource {
    let cache_root = source_dir.with_extension("cache");
    TarSource::new(archive, source_dir, checksum, "partcraft")
        .with_cache(FileCache::with_root(cache_root))
}

#[tokio::test]
async fn pull_strips_the_sole_top_directory() {
    let dir = tempfile::tempdir().unwrap();
    let archive = make_archive(dir.path(), "project-1.0").await;

    let source_dir = dir.path().join("src-dir");
    let tar = tar_source(archive, source_dir.clone(), None);
    tar.pull().await.unwrap();

    assert!(source_dir.join("Makefile").is_file());
    assert!(source_dir.join("src/main.c").is_file());
    assert!(!source_dir.join("project-1.0").exists());
}

#[tokio::test]
async fn pull_verifies_checksum() {
    let dir = tempfile::tempdir().unwrap();
    let archive = make_archive(dir.path(), "project-1.0").await;
    let digest = fs_utils::calculate_hash(&archive, "sha256").unwrap().unwrap();

    let good = tar_source(
        archive.clone(),
        dir.path().join("good"),
        Some(format!("sha256/{digest}")),
    );
    good.pull().await.unwrap();
    assert!(dir.path().join("good/Makefile").is_file());

    let bad = tar_source(
        archive,
        dir.path().join("bad"),
        Some("sha256/0000".to_string()),
    );
    let err = bad.pull().await.unwrap_err();
    assert!(matches!(
        err,
        SourceError::Checksum(ChecksumError::Mismatch { .. })
    ));
}

#[tokio::test]
async fn verified_archives_are_served_from_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let archive = make_archive(dir.path(), "project-1.0").await;
    let digest = fs_utils::calculate_hash(&archive, "sha256").unwrap().unwrap();

    let tar = tar_source(
        archive.clone(),
        dir.path().join("src-dir"),
        Some(format!("sha256/{digest}")),
    );
    tar.pull().await.unwrap();

    // the original may disappear; the cached revision still provisions
    fs::remove_file(&archive).unwrap();
    tar.update().await.unwrap();
    assert!(dir.path().join("src-dir/Makefile").is_file());
}

#[tokio::test]
async fn pull_missing_archive_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let tar = tar_source(
        dir.path().join("missing.tar"),
        dir.path().join("src-dir"),
        None,
    );
    assert!(matches!(tar.pull().await, Err(SourceError::Pull(_))));
}

#[tokio::test]
async fn check_is_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let tar = tar_source(dir.path().join("a.tar"), dir.path().join("b"), None);
    assert_eq!(
        tar.check(&dir.path().join("state")).unwrap(),
        UpdateCheck::Unsupported
    );
}
