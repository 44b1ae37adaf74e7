// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;

#[tokio::test]
async fn empty_requests_succeed() {
    let repo = NoopRepository::new();
    repo.update_package_list("partcraft", "amd64").await.unwrap();
    repo.refresh_build_packages().await.unwrap();
    assert!(repo.install_build_packages(&[]).await.unwrap().is_empty());
    let fetched = repo
        .fetch_stage_packages("partcraft", &[], "amd64", &PathBuf::from("/nowhere"))
        .await
        .unwrap();
    assert!(fetched.is_empty());
}

#[tokio::test]
async fn declared_build_packages_fail_loudly() {
    let repo = NoopRepository::new();
    let err = repo
        .install_build_packages(&["gcc".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, PackageError::BuildPackageNotFound(name) if name == "gcc"));
}

#[tokio::test]
async fn declared_stage_packages_fail_loudly() {
    let repo = NoopRepository::new();
    let err = repo
        .fetch_stage_packages(
            "partcraft",
            &["libssl3".to_string()],
            "amd64",
            &PathBuf::from("/nowhere"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PackageError::PackageFetchError(_)));
}
