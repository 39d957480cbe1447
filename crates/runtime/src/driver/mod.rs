// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container runtime driver abstraction.
//!
//! The orchestrator core treats the container runtime as a thin collaborator
//! behind this trait: provision a sandbox, exec commands in it, copy files
//! out, tear it down. The Docker CLI driver is the production implementation;
//! tests use [`FakeDriver`].

mod docker;

pub use docker::DockerCliDriver;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{DriverCall, FakeDriver, FakeExecResult};

use async_trait::async_trait;
use orca_core::{ContainerSecurity, ResourceSpec};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Errors from container runtime operations.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("image pull failed: {0}")]
    Pull(String),
    #[error("container create failed: {0}")]
    Create(String),
    #[error("container start failed: {0}")]
    Start(String),
    #[error("exec failed: {0}")]
    Exec(String),
    #[error("command timed out after {seconds}s")]
    Timeout { seconds: u64 },
    #[error("copy out failed: {0}")]
    CopyOut(String),
    #[error("path not found in container: {0}")]
    NotFound(String),
    #[error("container remove failed: {0}")]
    Remove(String),
    #[error("stats unavailable: {0}")]
    Stats(String),
}

/// Options for creating a sandbox container.
#[derive(Debug, Clone, Default)]
pub struct CreateOpts {
    pub image: String,
    pub env: HashMap<String, String>,
    pub working_dir: Option<String>,
    pub resources: ResourceSpec,
    pub security: ContainerSecurity,
}

/// Captured output of one exec'd command.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecOutput {
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ExecOutput {
    /// Successful empty output, useful as a fake default.
    pub fn ok() -> Self {
        Self {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::from_millis(1),
        }
    }
}

/// Resource usage snapshot for a running sandbox.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerStats {
    pub cpu_percent: f64,
    pub memory_usage: String,
}

/// Adapter for the container runtime (Docker, etc.)
#[async_trait]
pub trait RuntimeDriver: Clone + Send + Sync + 'static {
    /// Pull an image if not already present.
    async fn pull(&self, image: &str) -> Result<(), DriverError>;

    /// Create a sandbox container, returning its id. The container is held
    /// open so commands can be exec'd into it after [`start`](Self::start).
    async fn create(&self, opts: &CreateOpts) -> Result<String, DriverError>;

    /// Start a created container.
    async fn start(&self, id: &str) -> Result<(), DriverError>;

    /// Execute a shell command inside the container, capturing output.
    ///
    /// Returns [`DriverError::Timeout`] if the command does not finish
    /// within `timeout`.
    async fn exec(&self, id: &str, command: &str, timeout: Duration)
        -> Result<ExecOutput, DriverError>;

    /// Copy a file out of the container.
    async fn copy_out(&self, id: &str, path: &str) -> Result<Vec<u8>, DriverError>;

    /// Remove the container. `force` kills a running container first.
    async fn remove(&self, id: &str, force: bool) -> Result<(), DriverError>;

    /// Resource usage snapshot.
    async fn stats(&self, id: &str) -> Result<ContainerStats, DriverError>;
}
