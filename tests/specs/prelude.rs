// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for the engine specs.

use orca_core::{Clock, FakeClock, RunRecord, SecurityPolicy, WorkflowRecord};
use orca_engine::{
    JobManager, PolicyEngine, QuotaTracker, WorkflowEngine, WorkspaceRegistry,
};
use orca_runtime::FakeDriver;
use orca_storage::{AuditLog, RunStore, WorkflowStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub struct Harness {
    pub manager: Arc<JobManager<FakeDriver>>,
    pub engine: WorkflowEngine<FakeDriver>,
    pub driver: FakeDriver,
    pub quota: Arc<QuotaTracker>,
    pub audit: Arc<AuditLog>,
    pub registry: Arc<WorkspaceRegistry>,
    pub store: Arc<RunStore>,
    pub clock: Arc<FakeClock>,
    pub root: std::path::PathBuf,
    _dir: TempDir,
}

pub fn harness() -> Harness {
    harness_with_policy(SecurityPolicy::default())
}

pub fn harness_with_policy(policy: SecurityPolicy) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();
    let driver = FakeDriver::new();
    let clock = Arc::new(FakeClock::new());
    let store = Arc::new(RunStore::new(&root));
    let quota = Arc::new(QuotaTracker::with_clock(clock.clone()));
    let audit = Arc::new(AuditLog::new(&root));
    let registry = Arc::new(WorkspaceRegistry::new());
    let manager = Arc::new(JobManager::with_clock(
        driver.clone(),
        PolicyEngine::new(policy),
        quota.clone(),
        audit.clone(),
        registry.clone(),
        store.clone(),
        clock.clone(),
    ));
    let workflow_store = Arc::new(WorkflowStore::new(&root));
    let engine = WorkflowEngine::new(
        manager.clone(),
        workflow_store,
        audit.clone(),
        clock.clone() as Arc<dyn Clock>,
    );
    Harness {
        manager,
        engine,
        driver,
        quota,
        audit,
        registry,
        store,
        clock,
        root,
        _dir: dir,
    }
}

pub async fn wait_job(h: &Harness, job_id: &str) -> RunRecord {
    for _ in 0..600 {
        if let Some(record) = h.manager.get(job_id) {
            if record.is_terminal() {
                return record;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {job_id} did not reach a terminal state");
}

pub async fn wait_workflow(h: &Harness, workflow_id: &str) -> WorkflowRecord {
    for _ in 0..600 {
        if let Some(record) = h.engine.get_workflow(workflow_id) {
            if record.is_terminal() {
                return record;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("workflow {workflow_id} did not reach a terminal state");
}

/// Wait until a workspace's running-job count drops to zero.
pub async fn wait_quota_released(h: &Harness, workspace_id: &str) {
    let ws = orca_core::WorkspaceId::new(workspace_id);
    for _ in 0..600 {
        if h.quota.get_usage(&ws).current_running_jobs == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("quota for {workspace_id} was not released");
}
