// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Default timeout for git source operations.
pub const GIT_TIMEOUT: Duration = Duration::from_secs(600);

/// Default timeout for archive extraction.
pub const TAR_TIMEOUT: Duration = Duration::from_secs(300);

/// Default timeout for package tool invocations.
pub const PACKAGE_TIMEOUT: Duration = Duration::from_secs(600);

/// Run a subprocess command with a timeout.
///
/// Wraps `Command::output()` with `tokio::time::timeout`, converting
/// timeout expiration into a descriptive error message. The child process
/// is killed automatically if the timeout elapses (via the tokio `Child`
/// drop implementation).
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(format!("{} failed: {}", description, io_err)),
        Err(_elapsed) => Err(format!(
            "{} timed out after {}s",
            description,
            timeout.as_secs()
        )),
    }
}

/// Run a subprocess command and require a zero exit status.
///
/// On failure the first stderr line is folded into the error message so
/// source and package errors stay one line.
pub async fn run_checked(
    cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    let output = run_with_timeout(cmd, timeout, description).await?;
    if output.status.success() {
        return Ok(output);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = stderr.lines().next().unwrap_or("no error output");
    Err(format!(
        "{} exited with {}: {}",
        description, output.status, detail
    ))
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
