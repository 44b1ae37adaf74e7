// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: source handlers, package repositories, the
//! file cache and subprocess helpers.

pub mod cache;
pub mod checksum;
pub mod fs_utils;
pub mod packages;
pub mod sources;
pub mod subprocess;

pub use cache::FileCache;
pub use checksum::{split_checksum, verify_checksum};
pub use packages::{NoopRepository, PackageError, Repository};
pub use sources::{source_handler_for_part, SourceError, SourceHandler, UpdateCheck};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use packages::{FakeRepository, RepositoryCall};
