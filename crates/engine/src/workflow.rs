// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DAG scheduling over the job manager.
//!
//! Each submitted workflow gets one worker task that loops: refresh child
//! states, skip jobs whose dependencies failed (or whose condition is
//! false), submit the ready set, persist, sleep. Child jobs go through the
//! same admission pipeline as directly submitted jobs; a child rejection is
//! recorded as ERROR in the workflow, never raised.

use crate::cancel::CancelToken;
use crate::error::WorkflowSubmitError;
use crate::manager::JobManager;
use orca_core::{
    AuditAction, AuditEvent, AuditOutcome, Clock, IdGen, JobCommand, JobSpec, JobStatus,
    ResourceSpec, SandboxSpec, UuidIdGen, WorkflowRecord, WorkflowStatus, WorkspaceId,
};
use orca_runtime::RuntimeDriver;
use orca_storage::{AuditLog, WorkflowStore};
use orca_workflow::{Condition, WorkflowSpec};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// How often a workflow worker re-examines child states.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

type SharedWorkflowRecord = Arc<Mutex<WorkflowRecord>>;

struct WorkflowEntry {
    record: SharedWorkflowRecord,
    cancel: CancelToken,
    /// Held so the worker stays attached to its entry; never awaited.
    #[allow(dead_code)]
    worker: JoinHandle<()>,
}

/// Schedules workflows as DAGs of jobs.
pub struct WorkflowEngine<D: RuntimeDriver> {
    manager: Arc<JobManager<D>>,
    store: Arc<WorkflowStore>,
    audit: Arc<AuditLog>,
    clock: Arc<dyn Clock>,
    workflows: Mutex<HashMap<String, WorkflowEntry>>,
}

impl<D: RuntimeDriver> WorkflowEngine<D> {
    pub fn new(
        manager: Arc<JobManager<D>>,
        store: Arc<WorkflowStore>,
        audit: Arc<AuditLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            manager,
            store,
            audit,
            clock,
            workflows: Mutex::new(HashMap::new()),
        }
    }

    /// Validate and launch a workflow.
    ///
    /// Validation (names, dependencies, acyclicity, conditions) happens
    /// before any child job is submitted. Must be called from within a
    /// tokio runtime.
    pub fn submit_workflow(
        &self,
        spec: WorkflowSpec,
        workflow_id: Option<String>,
        workspace_id: Option<WorkspaceId>,
        triggered_by: &str,
    ) -> Result<WorkflowRecord, WorkflowSubmitError> {
        spec.validate()?;
        let workflow_id = workflow_id.unwrap_or_else(|| {
            let id = UuidIdGen.next();
            format!("wf-{}", id.split('-').next().unwrap_or(&id))
        });

        let mut workflows = self.workflows.lock();
        if workflows.contains_key(&workflow_id) || self.store.get(&workflow_id).is_some() {
            return Err(WorkflowSubmitError::DuplicateWorkflow(workflow_id));
        }

        let record = WorkflowRecord::new(
            &workflow_id,
            &spec.name,
            spec.jobs.keys().cloned(),
            triggered_by,
            self.clock.now(),
        );
        if let Err(e) = self.store.put(&record) {
            warn!(workflow_id, error = %e, "failed to persist workflow record");
        }
        self.audit.record(
            &AuditEvent::new(
                self.clock.now(),
                AuditAction::WorkflowSubmitted,
                &workflow_id,
                AuditOutcome::Allowed,
            )
            .with_workspace(workspace_id.clone())
            .with_details(serde_json::json!({ "spec_name": spec.name })),
        );
        info!(workflow_id, spec_name = %spec.name, jobs = spec.jobs.len(), "workflow submitted");

        let shared: SharedWorkflowRecord = Arc::new(Mutex::new(record.clone()));
        let cancel = CancelToken::new();
        let worker = tokio::spawn(run_workflow(
            self.manager.clone(),
            self.store.clone(),
            self.audit.clone(),
            self.clock.clone(),
            spec,
            workflow_id.clone(),
            workspace_id,
            shared.clone(),
            cancel.clone(),
        ));
        workflows.insert(
            workflow_id,
            WorkflowEntry {
                record: shared,
                cancel,
                worker,
            },
        );
        Ok(record)
    }

    /// Look up a workflow, falling back to the durable store.
    pub fn get_workflow(&self, workflow_id: &str) -> Option<WorkflowRecord> {
        if let Some(entry) = self.workflows.lock().get(workflow_id) {
            return Some(entry.record.lock().clone());
        }
        self.store.get(workflow_id)
    }

    /// Workflows submitted in this process, newest first.
    pub fn list_workflows(&self) -> Vec<WorkflowRecord> {
        let mut records: Vec<WorkflowRecord> = self
            .workflows
            .lock()
            .values()
            .map(|entry| entry.record.lock().clone())
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    /// Request cancellation. The worker cancels all non-terminal children
    /// and settles the workflow to CANCELLED once they are terminal.
    pub fn cancel_workflow(&self, workflow_id: &str) -> (bool, Option<WorkflowRecord>) {
        let workflows = self.workflows.lock();
        let Some(entry) = workflows.get(workflow_id) else {
            return (false, None);
        };
        entry.cancel.cancel();
        let record = entry.record.lock().clone();
        (true, Some(record))
    }
}

/// Persist the current in-memory record to the durable store.
fn persist(store: &Arc<WorkflowStore>, record: &SharedWorkflowRecord) {
    let snapshot = record.lock().clone();
    if let Err(e) = store.put(&snapshot) {
        warn!(workflow_id = %snapshot.workflow_id, error = %e, "failed to persist workflow record");
    }
}

/// The per-workflow worker loop.
#[allow(clippy::too_many_arguments)]
async fn run_workflow<D: RuntimeDriver>(
    manager: Arc<JobManager<D>>,
    store: Arc<WorkflowStore>,
    audit: Arc<AuditLog>,
    clock: Arc<dyn Clock>,
    spec: WorkflowSpec,
    workflow_id: String,
    workspace_id: Option<WorkspaceId>,
    record: SharedWorkflowRecord,
    cancel: CancelToken,
) {
    {
        let mut rec = record.lock();
        rec.status = WorkflowStatus::Running;
        rec.started_at = Some(clock.now());
    }
    persist(&store, &record);

    // Jobs skipped because a dependency failed, as opposed to skipped by
    // their `when` condition. Distinguishes FAILED from PARTIAL_SUCCESS.
    let mut dep_skipped: HashSet<String> = HashSet::new();
    let mut cancelling = false;

    loop {
        refresh_children(&manager, &record);

        if cancel.is_cancelled() && !cancelling {
            cancelling = true;
            propagate_cancel(&manager, &clock, &record).await;
        }

        if !cancelling {
            schedule_ready(
                &manager,
                &clock,
                &spec,
                &workflow_id,
                &workspace_id,
                &record,
                &mut dep_skipped,
            );
        }

        persist(&store, &record);

        let all_terminal = record
            .lock()
            .job_statuses
            .values()
            .all(|js| js.status.is_terminal());
        if all_terminal {
            let status = {
                let mut rec = record.lock();
                rec.status = if cancelling {
                    WorkflowStatus::Cancelled
                } else {
                    aggregate(&rec, &dep_skipped)
                };
                rec.finished_at = Some(clock.now());
                rec.status
            };
            persist(&store, &record);
            let outcome = match status {
                WorkflowStatus::Success => AuditOutcome::Allowed,
                _ => AuditOutcome::Error,
            };
            audit.record(
                &AuditEvent::new(
                    clock.now(),
                    AuditAction::WorkflowTerminal,
                    &workflow_id,
                    outcome,
                )
                .with_workspace(workspace_id.clone())
                .with_details(serde_json::json!({ "status": status.to_string() })),
            );
            info!(workflow_id, %status, "workflow finished");
            return;
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Pull current child states from the manager into the workflow record.
fn refresh_children<D: RuntimeDriver>(manager: &JobManager<D>, record: &SharedWorkflowRecord) {
    let tracked: Vec<(String, String)> = record
        .lock()
        .job_statuses
        .iter()
        .filter(|(_, js)| !js.status.is_terminal())
        .filter_map(|(name, js)| js.job_id.clone().map(|id| (name.clone(), id)))
        .collect();
    for (name, job_id) in tracked {
        let Some(child) = manager.get(&job_id) else {
            continue;
        };
        let mut rec = record.lock();
        if let Some(js) = rec.job_statuses.get_mut(&name) {
            js.status = child.status;
            js.started_at = child.started_at;
            js.finished_at = child.finished_at;
            js.error = child.error;
        }
    }
}

/// Cancel submitted children and terminate never-submitted ones.
async fn propagate_cancel<D: RuntimeDriver>(
    manager: &JobManager<D>,
    clock: &Arc<dyn Clock>,
    record: &SharedWorkflowRecord,
) {
    let targets: Vec<(String, Option<String>)> = record
        .lock()
        .job_statuses
        .iter()
        .filter(|(_, js)| !js.status.is_terminal())
        .map(|(name, js)| (name.clone(), js.job_id.clone()))
        .collect();
    for (name, job_id) in targets {
        match job_id {
            Some(job_id) => {
                let _ = manager.cancel(&job_id).await;
            }
            None => {
                let mut rec = record.lock();
                if let Some(js) = rec.job_statuses.get_mut(&name) {
                    js.status = JobStatus::Cancelled;
                    js.finished_at = Some(clock.now());
                    js.error = Some("Workflow cancelled".to_string());
                }
            }
        }
    }
}

/// Skip or submit every still-pending job whose dependencies are terminal.
fn schedule_ready<D: RuntimeDriver>(
    manager: &JobManager<D>,
    clock: &Arc<dyn Clock>,
    spec: &WorkflowSpec,
    workflow_id: &str,
    workspace_id: &Option<WorkspaceId>,
    record: &SharedWorkflowRecord,
    dep_skipped: &mut HashSet<String>,
) {
    let statuses: HashMap<String, JobStatus> = record
        .lock()
        .job_statuses
        .iter()
        .map(|(name, js)| (name.clone(), js.status))
        .collect();
    let pending: Vec<String> = record
        .lock()
        .job_statuses
        .iter()
        .filter(|(_, js)| js.job_id.is_none() && !js.status.is_terminal())
        .map(|(name, _)| name.clone())
        .collect();

    for name in pending {
        let Some(job_def) = spec.jobs.get(&name) else {
            continue;
        };
        let dep_status = |dep: &String| statuses.get(dep).copied().unwrap_or(JobStatus::Queued);
        if !job_def.depends_on.iter().all(|d| dep_status(d).is_terminal()) {
            continue;
        }

        let failed_dep = job_def.depends_on.iter().any(|d| {
            let status = dep_status(d);
            status.is_failure() || status == JobStatus::Skipped
        });
        if failed_dep && !job_def.continue_on_error {
            mark_skipped(clock, record, &name, "Skipped: dependency did not succeed");
            dep_skipped.insert(name);
            continue;
        }

        if let Some(when) = &job_def.when {
            // Parse errors were rejected at submit
            let Ok(condition) = Condition::parse(when) else {
                continue;
            };
            // Conditions gate on the jobs they read, even non-dependencies:
            // wait until every referenced job is terminal before deciding.
            let referenced_settled = condition
                .referenced_jobs()
                .all(|job| statuses.get(job).is_none_or(|s| s.is_terminal()));
            if !referenced_settled {
                continue;
            }
            let holds = condition.eval(&|job: &str| statuses.get(job).copied());
            if !holds {
                mark_skipped(clock, record, &name, "Skipped: condition not met");
                continue;
            }
        }

        let job_id = format!("wf-{}-{}", workflow_id, name);
        let job_spec = JobSpec {
            job_id: job_id.clone(),
            workspace_id: workspace_id.clone(),
            sandbox: SandboxSpec {
                image: job_def.image.clone(),
                env: job_def.env.clone().into_iter().collect(),
                working_dir: None,
                resources: ResourceSpec::default(),
            },
            commands: job_def.commands.iter().map(JobCommand::new).collect(),
            artifacts: job_def.artifacts.clone(),
            metadata: HashMap::new(),
        };
        match manager.submit(job_spec) {
            Ok(child) => {
                let mut rec = record.lock();
                if let Some(js) = rec.job_statuses.get_mut(&name) {
                    js.job_id = Some(job_id);
                    js.status = child.status;
                }
            }
            Err(e) => {
                warn!(workflow_id, job = %name, error = %e, "child job rejected");
                let mut rec = record.lock();
                if let Some(js) = rec.job_statuses.get_mut(&name) {
                    js.status = JobStatus::Error;
                    js.finished_at = Some(clock.now());
                    js.error = Some(e.to_string());
                }
            }
        }
    }
}

fn mark_skipped(
    clock: &Arc<dyn Clock>,
    record: &SharedWorkflowRecord,
    name: &str,
    reason: &str,
) {
    let mut rec = record.lock();
    if let Some(js) = rec.job_statuses.get_mut(name) {
        js.status = JobStatus::Skipped;
        js.finished_at = Some(clock.now());
        js.error = Some(reason.to_string());
    }
}

/// Terminal status for a settled, non-cancelled workflow.
///
/// SUCCESS when nothing failed (condition-skips included); PARTIAL_SUCCESS
/// when failures occurred but no downstream job was blocked by them, i.e.
/// fan-out siblings all still ran; FAILED otherwise.
fn aggregate(record: &WorkflowRecord, dep_skipped: &HashSet<String>) -> WorkflowStatus {
    let any_failure = record
        .job_statuses
        .values()
        .any(|js| js.status.is_failure());
    if !any_failure {
        return WorkflowStatus::Success;
    }
    let any_success = record
        .job_statuses
        .values()
        .any(|js| js.status == JobStatus::Success);
    if any_success && dep_skipped.is_empty() {
        WorkflowStatus::PartialSuccess
    } else {
        WorkflowStatus::Failed
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
