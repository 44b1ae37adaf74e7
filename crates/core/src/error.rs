// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error types.

use thiserror::Error;

/// An invariant the engine relies on was violated.
///
/// Internal errors are not recoverable; they indicate a bug in the engine
/// rather than a problem with the user's project.
#[derive(Debug, Error)]
#[error("internal error: {0}")]
pub struct InternalError(pub String);

impl InternalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
