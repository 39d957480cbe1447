// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow run records.
//!
//! The definition types (parsed from YAML) live in the workflow crate; this
//! module holds the persisted state of a workflow run, recomputed from its
//! child job states.

use crate::job::JobStatus;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate status of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Success,
    Failed,
    PartialSuccess,
    Cancelled,
}

impl WorkflowStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkflowStatus::Pending | WorkflowStatus::Running)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowStatus::Pending => write!(f, "pending"),
            WorkflowStatus::Running => write!(f, "running"),
            WorkflowStatus::Success => write!(f, "success"),
            WorkflowStatus::Failed => write!(f, "failed"),
            WorkflowStatus::PartialSuccess => write!(f, "partial_success"),
            WorkflowStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// State of one named job within a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowJobStatus {
    pub job_name: String,
    pub status: JobStatus,
    /// Derived job id once submitted (`wf-<workflow_id>-<job_name>`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowJobStatus {
    pub fn pending(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            status: JobStatus::Queued,
            job_id: None,
            started_at: None,
            finished_at: None,
            error: None,
        }
    }
}

/// Persisted state of a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub workflow_id: String,
    pub spec_name: String,
    pub status: WorkflowStatus,
    /// Keyed by job name, in definition order.
    pub job_statuses: IndexMap<String, WorkflowJobStatus>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub triggered_by: String,
}

impl WorkflowRecord {
    pub fn new(
        workflow_id: impl Into<String>,
        spec_name: impl Into<String>,
        job_names: impl IntoIterator<Item = String>,
        triggered_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let job_statuses = job_names
            .into_iter()
            .map(|name| (name.clone(), WorkflowJobStatus::pending(name)))
            .collect();
        Self {
            workflow_id: workflow_id.into(),
            spec_name: spec_name.into(),
            status: WorkflowStatus::Pending,
            job_statuses,
            created_at: now,
            started_at: None,
            finished_at: None,
            triggered_by: triggered_by.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
