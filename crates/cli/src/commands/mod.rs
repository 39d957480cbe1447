// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations.
//!
//! The CLI is a thin adapter: it assembles the engine's collaborators,
//! forwards arguments, and prints records as JSON. Exit codes: 0 on
//! success, 1 on submission/validation/not-found errors, 130 when the
//! user interrupts a wait.

pub mod job;
pub mod workflow;

use orca_core::{Clock, JobStatus, SystemClock};
use orca_engine::{JobManager, PolicyEngine, QuotaTracker, WorkflowEngine, WorkspaceRegistry};
use orca_runtime::DockerCliDriver;
use orca_storage::{AuditLog, RunStore, WorkflowStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Exit code for a user interrupt (Ctrl-C) during a wait.
pub const EXIT_INTERRUPTED: u8 = 130;

/// Default output root: `~/.orcaops/artifacts`.
pub fn default_output_root() -> PathBuf {
    JobManager::<DockerCliDriver>::default_output_root()
}

/// The engine and its collaborators, wired for the local Docker CLI.
pub struct Stack {
    pub manager: Arc<JobManager<DockerCliDriver>>,
    pub engine: WorkflowEngine<DockerCliDriver>,
    pub store: Arc<RunStore>,
}

impl Stack {
    pub fn new(root: PathBuf) -> Self {
        let driver = DockerCliDriver::new();
        let store = Arc::new(RunStore::new(&root));
        let quota = Arc::new(QuotaTracker::new());
        let audit = Arc::new(AuditLog::new(&root));
        let registry = Arc::new(WorkspaceRegistry::new());
        let manager = Arc::new(JobManager::new(
            driver,
            PolicyEngine::default(),
            quota,
            audit.clone(),
            registry,
            store.clone(),
        ));
        let workflow_store = Arc::new(WorkflowStore::new(&root));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let engine = WorkflowEngine::new(manager.clone(), workflow_store, audit, clock);
        Self {
            manager,
            engine,
            store,
        }
    }
}

/// Parse a status filter argument through its serde name.
pub fn parse_status(raw: &str) -> anyhow::Result<JobStatus> {
    serde_json::from_value(serde_json::Value::String(raw.to_ascii_lowercase()))
        .map_err(|_| anyhow::anyhow!("unknown status '{raw}'"))
}

/// Pretty-print a serializable record to stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
