// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job admission and registry.
//!
//! Admission runs synchronously in a fixed order: uniqueness, policy, quota
//! reservation, security injection. Each step short-circuits with an audit
//! event and no other side effects, so a rejected submit leaves nothing
//! behind. Admitted jobs get a worker task; quota release and the terminal
//! audit event happen on every worker exit path.

use crate::cancel::CancelToken;
use crate::error::SubmitError;
use crate::policy::PolicyEngine;
use crate::quota::QuotaTracker;
use crate::runner::JobRunner;
use crate::workspace::WorkspaceRegistry;
use crate::SharedRecord;
use orca_core::{
    AuditAction, AuditEvent, AuditOutcome, Clock, IdGen, JobSpec, JobStatus, RunRecord,
    SystemClock, UuidIdGen, Workspace, WorkspaceStatus, WorkspaceUsage, SECURITY_OPTS_KEY,
};
use orca_core::WorkspaceId;
use orca_runtime::RuntimeDriver;
use orca_storage::{AuditLog, RunStore};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::warn;

/// In-memory binding of a submitted job: spec, shared record, cancellation
/// token, and worker handle. Owned by the manager for the process lifetime.
struct JobEntry {
    spec: JobSpec,
    record: SharedRecord,
    cancel: CancelToken,
    /// Held so the worker stays attached to its entry; never awaited.
    #[allow(dead_code)]
    worker: JoinHandle<()>,
}

/// Admission pipeline and in-memory job registry.
pub struct JobManager<D: RuntimeDriver> {
    driver: D,
    runner: JobRunner<D>,
    store: Arc<RunStore>,
    policy: PolicyEngine,
    quota: Arc<QuotaTracker>,
    audit: Arc<AuditLog>,
    workspaces: Arc<WorkspaceRegistry>,
    clock: Arc<dyn Clock>,
    jobs: Mutex<HashMap<String, JobEntry>>,
}

impl<D: RuntimeDriver> JobManager<D> {
    pub fn new(
        driver: D,
        policy: PolicyEngine,
        quota: Arc<QuotaTracker>,
        audit: Arc<AuditLog>,
        workspaces: Arc<WorkspaceRegistry>,
        store: Arc<RunStore>,
    ) -> Self {
        Self::with_clock(
            driver,
            policy,
            quota,
            audit,
            workspaces,
            store,
            Arc::new(SystemClock),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_clock(
        driver: D,
        policy: PolicyEngine,
        quota: Arc<QuotaTracker>,
        audit: Arc<AuditLog>,
        workspaces: Arc<WorkspaceRegistry>,
        store: Arc<RunStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let runner = JobRunner::new(driver.clone(), store.clone(), quota.clone(), clock.clone());
        Self {
            driver,
            runner,
            store,
            policy,
            quota,
            audit,
            workspaces,
            clock,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Default output root: `~/.orcaops/artifacts`.
    pub fn default_output_root() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".orcaops")
            .join("artifacts")
    }

    /// Submit a job through the admission pipeline.
    ///
    /// Returns the QUEUED record; the job runs on its own worker task.
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, mut spec: JobSpec) -> Result<RunRecord, SubmitError> {
        if spec.job_id.is_empty() {
            spec.job_id = format!("job-{}", UuidIdGen.next());
        }

        // The registry lock is held across admission so concurrent submits
        // of the same id serialize on the uniqueness check.
        let mut jobs = self.jobs.lock();
        if jobs.contains_key(&spec.job_id) {
            return Err(SubmitError::DuplicateJob(spec.job_id));
        }

        let workspace = self.resolve_workspace(&spec)?;

        let result = self
            .policy
            .validate_job(&spec, workspace.as_ref().map(|ws| &ws.settings));
        if !result.allowed {
            self.audit.record(
                &AuditEvent::new(
                    self.clock.now(),
                    AuditAction::PolicyViolation,
                    &spec.job_id,
                    AuditOutcome::Denied,
                )
                .with_workspace(spec.workspace_id.clone())
                .with_details(serde_json::json!({ "violations": result.violations })),
            );
            return Err(SubmitError::PolicyViolation(result.violations.join("; ")));
        }

        if let (Some(workspace_id), Some(workspace)) = (&spec.workspace_id, &workspace) {
            if let Err(reason) =
                self.quota
                    .check_and_reserve_job(workspace_id, &workspace.limits, &spec.job_id)
            {
                self.audit.record(
                    &AuditEvent::new(
                        self.clock.now(),
                        AuditAction::QuotaDenied,
                        &spec.job_id,
                        AuditOutcome::Denied,
                    )
                    .with_workspace(spec.workspace_id.clone())
                    .with_details(serde_json::json!({ "reason": reason })),
                );
                return Err(SubmitError::QuotaExceeded(reason));
            }
        }

        if let Ok(value) = serde_json::to_value(self.policy.container_security()) {
            spec.metadata.insert(SECURITY_OPTS_KEY.to_string(), value);
        }

        let record = RunRecord::new(&spec.job_id, &spec.sandbox.image, self.clock.now());
        if let Err(e) = self.store.put(&record) {
            warn!(job_id = %spec.job_id, error = %e, "failed to persist queued record");
        }
        self.audit.record(
            &AuditEvent::new(
                self.clock.now(),
                AuditAction::JobSubmitted,
                &spec.job_id,
                AuditOutcome::Allowed,
            )
            .with_workspace(spec.workspace_id.clone()),
        );

        let shared: SharedRecord = Arc::new(Mutex::new(record.clone()));
        let cancel = CancelToken::new();
        let worker = tokio::spawn(run_worker(
            self.runner.clone(),
            self.quota.clone(),
            self.audit.clone(),
            self.clock.clone(),
            spec.clone(),
            shared.clone(),
            cancel.clone(),
        ));
        jobs.insert(
            spec.job_id.clone(),
            JobEntry {
                spec,
                record: shared,
                cancel,
                worker,
            },
        );
        Ok(record)
    }

    /// Look up a job, falling back to the durable store for jobs that
    /// outlived this process.
    pub fn get(&self, job_id: &str) -> Option<RunRecord> {
        if let Some(entry) = self.jobs.lock().get(job_id) {
            return Some(entry.record.lock().clone());
        }
        self.store.get(job_id)
    }

    /// The admitted spec for a registered job, as the worker sees it
    /// (security options injected).
    pub fn spec(&self, job_id: &str) -> Option<JobSpec> {
        self.jobs.lock().get(job_id).map(|entry| entry.spec.clone())
    }

    /// Registered jobs, newest first, optionally filtered by status.
    pub fn list(&self, status: Option<JobStatus>) -> Vec<RunRecord> {
        let mut records: Vec<RunRecord> = self
            .jobs
            .lock()
            .values()
            .map(|entry| entry.record.lock().clone())
            .filter(|record| status.is_none_or(|s| record.status == s))
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    /// Cancel a job. Idempotent; returns the (possibly already terminal)
    /// record, or `(false, None)` for unknown ids.
    pub async fn cancel(&self, job_id: &str) -> (bool, Option<RunRecord>) {
        let (sandbox_id, snapshot) = {
            let jobs = self.jobs.lock();
            let Some(entry) = jobs.get(job_id) else {
                return (false, None);
            };
            entry.cancel.cancel();
            let mut rec = entry.record.lock();
            if rec.transition(JobStatus::Cancelled, self.clock.now()) {
                rec.error = Some("Job cancelled by user.".to_string());
            }
            (rec.sandbox_id.clone(), rec.clone())
        };

        // Best-effort: interrupts an in-flight exec so the worker observes
        // cancellation promptly. The worker's own teardown handles the rest.
        if let Some(sandbox_id) = sandbox_id {
            let _ = self.driver.remove(&sandbox_id, true).await;
        }
        if let Err(e) = self.store.put(&snapshot) {
            warn!(job_id, error = %e, "failed to persist cancelled record");
        }
        (true, Some(snapshot))
    }

    pub fn list_artifacts(&self, job_id: &str) -> Vec<String> {
        self.store.list_artifacts(job_id)
    }

    pub fn get_artifact(&self, job_id: &str, name: &str) -> Option<PathBuf> {
        self.store.get_artifact(job_id, name)
    }

    /// Quota usage snapshot for a workspace.
    pub fn usage(&self, workspace_id: &WorkspaceId) -> WorkspaceUsage {
        self.quota.get_usage(workspace_id)
    }

    fn resolve_workspace(&self, spec: &JobSpec) -> Result<Option<Workspace>, SubmitError> {
        let Some(workspace_id) = &spec.workspace_id else {
            return Ok(None);
        };
        let Some(workspace) = self.workspaces.get(workspace_id) else {
            return Err(SubmitError::UnknownWorkspace(workspace_id.to_string()));
        };
        if workspace.status == WorkspaceStatus::Suspended {
            self.audit.record(
                &AuditEvent::new(
                    self.clock.now(),
                    AuditAction::JobSubmitted,
                    &spec.job_id,
                    AuditOutcome::Denied,
                )
                .with_workspace(spec.workspace_id.clone())
                .with_details(serde_json::json!({ "reason": "workspace suspended" })),
            );
            return Err(SubmitError::SuspendedWorkspace(workspace_id.to_string()));
        }
        Ok(Some(workspace))
    }
}

/// Worker body: run to terminal, then release quota and audit,
/// unconditionally.
async fn run_worker<D: RuntimeDriver>(
    runner: JobRunner<D>,
    quota: Arc<QuotaTracker>,
    audit: Arc<AuditLog>,
    clock: Arc<dyn Clock>,
    spec: JobSpec,
    record: SharedRecord,
    cancel: CancelToken,
) {
    runner.run(&spec, &record, &cancel).await;

    if let Some(workspace_id) = &spec.workspace_id {
        quota.on_job_end(workspace_id, &spec.job_id);
    }
    let status = record.lock().status;
    let outcome = if status == JobStatus::Success {
        AuditOutcome::Allowed
    } else {
        AuditOutcome::Error
    };
    audit.record(
        &AuditEvent::new(clock.now(), AuditAction::JobTerminal, &spec.job_id, outcome)
            .with_workspace(spec.workspace_id.clone())
            .with_details(serde_json::json!({ "status": status.to_string() })),
    );
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
