// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Default timeout for image pulls. Registries can be slow on first fetch.
pub const PULL_TIMEOUT: Duration = Duration::from_secs(600);

/// Default timeout for container create/start/remove operations.
pub const CONTAINER_OP_TIMEOUT: Duration = Duration::from_secs(60);

/// Default timeout for copying an artifact out of a container.
pub const COPY_TIMEOUT: Duration = Duration::from_secs(120);

/// Default timeout for a stats snapshot.
pub const STATS_TIMEOUT: Duration = Duration::from_secs(10);

/// Run a subprocess command with a timeout.
///
/// Wraps `Command::output()` with `tokio::time::timeout`, converting timeout
/// expiration into a descriptive error message. `kill_on_drop` is set so the
/// child does not linger past the timeout.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    cmd.kill_on_drop(true);
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

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
