// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake runtime driver for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ContainerStats, CreateOpts, DriverError, ExecOutput, RuntimeDriver};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Recorded driver call
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    Pull { image: String },
    Create { image: String },
    Start { id: String },
    Exec { id: String, command: String },
    CopyOut { id: String, path: String },
    Remove { id: String, force: bool },
    Stats { id: String },
}

/// Scripted response for a specific exec command.
#[derive(Debug, Clone)]
pub enum FakeExecResult {
    Output(ExecOutput),
    /// Report the command as timed out.
    Timeout,
    Error(String),
    /// Block until the container is removed, then fail the exec. Lets tests
    /// hold a job in RUNNING until it is cancelled.
    HangUntilRemoved,
}

#[derive(Debug, Clone)]
struct FakeContainer {
    image: String,
    running: bool,
    removed: bool,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<DriverCall>,
    next_id: u64,
    containers: HashMap<String, FakeContainer>,
    exec_results: HashMap<String, FakeExecResult>,
    files: HashMap<String, Vec<u8>>,
    fail_pull: Option<String>,
    fail_create: Option<String>,
    fail_remove: Option<String>,
}

/// Fake runtime driver for testing.
///
/// Unscripted commands get a shell-flavored default: `echo X` produces
/// `X\n` with exit 0, `false` exits 1, everything else exits 0 silently.
#[derive(Clone, Default)]
pub struct FakeDriver {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the result of a specific command string.
    pub fn set_exec(&self, command: &str, result: FakeExecResult) {
        self.inner
            .lock()
            .exec_results
            .insert(command.to_string(), result);
    }

    /// Make a container path available for `copy_out`.
    pub fn put_file(&self, path: &str, bytes: &[u8]) {
        self.inner.lock().files.insert(path.to_string(), bytes.to_vec());
    }

    pub fn fail_pull(&self, message: &str) {
        self.inner.lock().fail_pull = Some(message.to_string());
    }

    pub fn fail_create(&self, message: &str) {
        self.inner.lock().fail_create = Some(message.to_string());
    }

    pub fn fail_remove(&self, message: &str) {
        self.inner.lock().fail_remove = Some(message.to_string());
    }

    /// All calls made against this driver, in order.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.inner.lock().calls.clone()
    }

    /// Commands exec'd against any container, in order.
    pub fn exec_commands(&self) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                DriverCall::Exec { command, .. } => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn created_count(&self) -> usize {
        self.inner.lock().containers.len()
    }

    /// True if the container was removed (force or not).
    pub fn was_removed(&self, id: &str) -> bool {
        self.inner
            .lock()
            .containers
            .get(id)
            .is_some_and(|c| c.removed)
    }

    fn default_exec(command: &str) -> ExecOutput {
        let mut out = ExecOutput::ok();
        if let Some(rest) = command.strip_prefix("echo ") {
            out.stdout = format!("{}\n", rest);
        } else if command.trim() == "false" {
            out.exit_code = 1;
        }
        out
    }
}

#[async_trait]
impl RuntimeDriver for FakeDriver {
    async fn pull(&self, image: &str) -> Result<(), DriverError> {
        let mut state = self.inner.lock();
        state.calls.push(DriverCall::Pull {
            image: image.to_string(),
        });
        if let Some(message) = &state.fail_pull {
            return Err(DriverError::Pull(message.clone()));
        }
        Ok(())
    }

    async fn create(&self, opts: &CreateOpts) -> Result<String, DriverError> {
        let mut state = self.inner.lock();
        state.calls.push(DriverCall::Create {
            image: opts.image.clone(),
        });
        if let Some(message) = &state.fail_create {
            return Err(DriverError::Create(message.clone()));
        }
        state.next_id += 1;
        let id = format!("sandbox-{}", state.next_id);
        state.containers.insert(
            id.clone(),
            FakeContainer {
                image: opts.image.clone(),
                running: false,
                removed: false,
            },
        );
        Ok(id)
    }

    async fn start(&self, id: &str) -> Result<(), DriverError> {
        let mut state = self.inner.lock();
        state.calls.push(DriverCall::Start { id: id.to_string() });
        match state.containers.get_mut(id) {
            Some(container) if !container.removed => {
                container.running = true;
                Ok(())
            }
            _ => Err(DriverError::Start(format!("no such container: {}", id))),
        }
    }

    async fn exec(
        &self,
        id: &str,
        command: &str,
        timeout: Duration,
    ) -> Result<ExecOutput, DriverError> {
        let scripted = {
            let mut state = self.inner.lock();
            state.calls.push(DriverCall::Exec {
                id: id.to_string(),
                command: command.to_string(),
            });
            match state.containers.get(id) {
                Some(container) if !container.removed => {}
                _ => return Err(DriverError::Exec(format!("no such container: {}", id))),
            }
            state.exec_results.get(command).cloned()
        };

        match scripted {
            None => Ok(Self::default_exec(command)),
            Some(FakeExecResult::Output(output)) => Ok(output),
            Some(FakeExecResult::Timeout) => Err(DriverError::Timeout {
                seconds: timeout.as_secs(),
            }),
            Some(FakeExecResult::Error(message)) => Err(DriverError::Exec(message)),
            Some(FakeExecResult::HangUntilRemoved) => {
                loop {
                    {
                        let state = self.inner.lock();
                        match state.containers.get(id) {
                            Some(container) if !container.removed => {}
                            _ => return Err(DriverError::Exec("container was removed".to_string())),
                        }
                    }
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }

    async fn copy_out(&self, id: &str, path: &str) -> Result<Vec<u8>, DriverError> {
        let mut state = self.inner.lock();
        state.calls.push(DriverCall::CopyOut {
            id: id.to_string(),
            path: path.to_string(),
        });
        state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| DriverError::NotFound(path.to_string()))
    }

    async fn remove(&self, id: &str, force: bool) -> Result<(), DriverError> {
        let mut state = self.inner.lock();
        state.calls.push(DriverCall::Remove {
            id: id.to_string(),
            force,
        });
        if let Some(message) = &state.fail_remove {
            return Err(DriverError::Remove(message.clone()));
        }
        match state.containers.get_mut(id) {
            Some(container) => {
                container.removed = true;
                container.running = false;
                Ok(())
            }
            None => Err(DriverError::Remove(format!("no such container: {}", id))),
        }
    }

    async fn stats(&self, id: &str) -> Result<ContainerStats, DriverError> {
        let mut state = self.inner.lock();
        state.calls.push(DriverCall::Stats { id: id.to_string() });
        match state.containers.get(id) {
            Some(container) if container.running => Ok(ContainerStats {
                cpu_percent: 0.0,
                memory_usage: format!("0B ({})", container.image),
            }),
            _ => Err(DriverError::Stats(format!("no such container: {}", id))),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
