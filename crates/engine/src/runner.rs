// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-job execution against the container runtime.
//!
//! The runner owns the container for the duration of the run and releases it
//! on every exit path. It never raises past admission: failures land in the
//! run record as a terminal status plus error text.

use crate::cancel::CancelToken;
use crate::quota::QuotaTracker;
use crate::SharedRecord;
use orca_core::{
    ArtifactMetadata, CleanupStatus, Clock, ContainerSecurity, JobSpec, JobStatus, StepResult,
    SECURITY_OPTS_KEY,
};
use orca_runtime::{CreateOpts, DriverError, RuntimeDriver};
use orca_storage::RunStore;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Executes one admitted job inside a container.
#[derive(Clone)]
pub struct JobRunner<D: RuntimeDriver> {
    driver: D,
    store: Arc<RunStore>,
    quota: Arc<QuotaTracker>,
    clock: Arc<dyn Clock>,
}

impl<D: RuntimeDriver> JobRunner<D> {
    pub fn new(
        driver: D,
        store: Arc<RunStore>,
        quota: Arc<QuotaTracker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            driver,
            store,
            quota,
            clock,
        }
    }

    /// Run the job to a terminal state and persist the final record.
    pub async fn run(&self, spec: &JobSpec, record: &SharedRecord, cancel: &CancelToken) {
        if cancel.is_cancelled() {
            self.finish(spec, record, JobStatus::Cancelled);
            return;
        }

        if let Err(e) = self.driver.pull(&spec.sandbox.image).await {
            record.lock().push_error(e.to_string());
            self.finish(spec, record, JobStatus::Error);
            return;
        }

        let opts = CreateOpts {
            image: spec.sandbox.image.clone(),
            env: spec.sandbox.env.clone(),
            working_dir: spec.sandbox.working_dir.clone(),
            resources: spec.sandbox.resources.clone(),
            security: security_opts(spec),
        };
        let sandbox_id = match self.driver.create(&opts).await {
            Ok(id) => id,
            Err(e) => {
                record.lock().push_error(e.to_string());
                self.finish(spec, record, JobStatus::Error);
                return;
            }
        };
        record.lock().sandbox_id = Some(sandbox_id.clone());
        if let Some(workspace_id) = &spec.workspace_id {
            self.quota.on_sandbox_start(workspace_id, &sandbox_id);
        }

        // The container exists from here on: every path below must reach
        // the teardown at the bottom.
        let failure = self.run_in_container(spec, record, cancel, &sandbox_id).await;

        let cleanup = match self.driver.remove(&sandbox_id, true).await {
            Ok(()) => CleanupStatus::Ok,
            Err(e) => {
                warn!(job_id = %spec.job_id, sandbox_id = %sandbox_id, error = %e,
                    "container cleanup failed");
                CleanupStatus::Failed
            }
        };
        record.lock().cleanup_status = Some(cleanup);
        if let Some(workspace_id) = &spec.workspace_id {
            self.quota.on_sandbox_end(workspace_id, &sandbox_id);
        }

        self.finish(spec, record, failure.unwrap_or(JobStatus::Success));
    }

    /// Start the container, execute the command list, extract artifacts.
    ///
    /// Returns the terminal failure status, or `None` for a clean run.
    async fn run_in_container(
        &self,
        spec: &JobSpec,
        record: &SharedRecord,
        cancel: &CancelToken,
        sandbox_id: &str,
    ) -> Option<JobStatus> {
        if let Err(e) = self.driver.start(sandbox_id).await {
            record.lock().push_error(e.to_string());
            return Some(JobStatus::Error);
        }

        let started = record.lock().transition(JobStatus::Running, self.clock.now());
        if !started {
            // Cancelled between admission and start
            return None;
        }
        self.persist(record);
        info!(job_id = %spec.job_id, sandbox_id, image = %spec.sandbox.image, "job running");

        let mut failure = None;
        for command in &spec.commands {
            if cancel.is_cancelled() {
                failure = Some(JobStatus::Cancelled);
                break;
            }
            let step_started = self.clock.now();
            let timeout = Duration::from_secs(command.timeout_s);
            match self.driver.exec(sandbox_id, &command.command, timeout).await {
                Ok(output) => {
                    let exit_code = output.exit_code;
                    debug!(job_id = %spec.job_id, command = %command.command, exit_code, "step finished");
                    record.lock().steps.push(StepResult {
                        command: command.command.clone(),
                        exit_code,
                        stdout: output.stdout,
                        stderr: output.stderr,
                        duration_seconds: output.duration.as_secs_f64(),
                        started_at: step_started,
                    });
                    if exit_code != 0 && command.fail_fast {
                        record.lock().push_error(format!(
                            "Command '{}' failed with exit code {}",
                            command.command, exit_code
                        ));
                        failure = Some(JobStatus::Failed);
                        break;
                    }
                }
                Err(DriverError::Timeout { seconds }) => {
                    let mut rec = record.lock();
                    rec.steps.push(StepResult {
                        command: command.command.clone(),
                        exit_code: -(seconds as i64),
                        stdout: String::new(),
                        stderr: String::new(),
                        duration_seconds: seconds as f64,
                        started_at: step_started,
                    });
                    rec.push_error(format!(
                        "Command '{}' timed out after {}s",
                        command.command, seconds
                    ));
                    drop(rec);
                    failure = Some(JobStatus::Timeout);
                    break;
                }
                Err(e) => {
                    if cancel.is_cancelled() {
                        // The exec died because cancellation removed the container
                        failure = Some(JobStatus::Cancelled);
                    } else {
                        record
                            .lock()
                            .push_error(format!("Command '{}' failed: {}", command.command, e));
                        failure = Some(JobStatus::Error);
                    }
                    break;
                }
            }
        }

        if failure != Some(JobStatus::Cancelled) && !cancel.is_cancelled() {
            self.extract_artifacts(spec, record, sandbox_id).await;
        }
        failure
    }

    /// Copy requested artifacts out of the container, hashing and sizing
    /// each. Missing artifacts are reported in the error field without
    /// failing an otherwise-successful job.
    async fn extract_artifacts(&self, spec: &JobSpec, record: &SharedRecord, sandbox_id: &str) {
        if spec.artifacts.is_empty() {
            return;
        }
        let dir = self.store.job_dir(&spec.job_id);
        if let Err(e) = std::fs::create_dir_all(&dir) {
            record
                .lock()
                .push_error(format!("failed to create artifact dir: {}", e));
            return;
        }

        let mut missing = Vec::new();
        for container_path in &spec.artifacts {
            let name = artifact_name(container_path);
            if name == "run.json" || name == "steps.jsonl" {
                record
                    .lock()
                    .push_error(format!("artifact name '{}' is reserved", name));
                continue;
            }
            match self.driver.copy_out(sandbox_id, container_path).await {
                Ok(bytes) => {
                    let file_path = dir.join(&name);
                    if let Err(e) = std::fs::write(&file_path, &bytes) {
                        record
                            .lock()
                            .push_error(format!("failed to write artifact '{}': {}", name, e));
                        continue;
                    }
                    let sha256 = format!("{:x}", Sha256::digest(&bytes));
                    record.lock().artifacts.push(ArtifactMetadata {
                        name,
                        path: container_path.clone(),
                        size_bytes: bytes.len() as u64,
                        sha256,
                    });
                }
                Err(e) => {
                    debug!(job_id = %spec.job_id, path = %container_path, error = %e,
                        "artifact not extracted");
                    missing.push(container_path.clone());
                }
            }
        }
        if !missing.is_empty() {
            record
                .lock()
                .push_error(format!("Missing artifacts: {}", missing.join(", ")));
        }
    }

    /// Apply the terminal status (merging around an earlier one) and persist.
    fn finish(&self, spec: &JobSpec, record: &SharedRecord, status: JobStatus) {
        {
            let mut rec = record.lock();
            rec.transition(status, self.clock.now());
            if rec.status == JobStatus::Cancelled && rec.error.is_none() {
                rec.error = Some("Job cancelled by user.".to_string());
            }
        }
        self.persist(record);
        let status = record.lock().status;
        info!(job_id = %spec.job_id, %status, "job finished");
    }

    /// Best-effort persistence: a storage failure never flips a run outcome.
    fn persist(&self, record: &SharedRecord) {
        let snapshot = record.lock().clone();
        if let Err(e) = self.store.put(&snapshot) {
            warn!(job_id = %snapshot.job_id, error = %e, "failed to persist run record");
        }
    }
}

/// Security options injected at admission, falling back to defaults when the
/// metadata entry is absent or malformed.
fn security_opts(spec: &JobSpec) -> ContainerSecurity {
    spec.metadata
        .get(SECURITY_OPTS_KEY)
        .and_then(|value| serde_json::from_value(value.clone()).ok())
        .unwrap_or_default()
}

/// Artifact file name derived from the container path.
fn artifact_name(container_path: &str) -> String {
    Path::new(container_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| container_path.trim_matches('/').replace('/', "_"))
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
