// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job specification and run record types.
//!
//! A [`JobSpec`] is the immutable input to the orchestrator; a [`RunRecord`]
//! is the mutable-by-owner run history that gets persisted. Terminal statuses
//! are absorbing: once a record reaches one, further transitions are refused
//! and callers merge their remaining fields around it.

use crate::workspace::WorkspaceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Metadata key under which container security options are injected at
/// admission for the runner to pick up.
pub const SECURITY_OPTS_KEY: &str = "_security_opts";

/// Default per-command timeout. Safety net for long-running user scripts.
pub const DEFAULT_COMMAND_TIMEOUT_S: u64 = 600;

/// Resource caps applied to the job's container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpus: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pids_limit: Option<u64>,
}

/// Container environment for a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxSpec {
    pub image: String,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(default)]
    pub resources: ResourceSpec,
}

impl SandboxSpec {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            env: HashMap::new(),
            working_dir: None,
            resources: ResourceSpec::default(),
        }
    }
}

fn default_timeout_s() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_S
}

fn default_fail_fast() -> bool {
    true
}

/// A single shell command executed inside the job's container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCommand {
    pub command: String,
    #[serde(default = "default_timeout_s")]
    pub timeout_s: u64,
    #[serde(default = "default_fail_fast")]
    pub fail_fast: bool,
}

impl JobCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout_s: DEFAULT_COMMAND_TIMEOUT_S,
            fail_fast: true,
        }
    }
}

/// Immutable input describing a job to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<WorkspaceId>,
    pub sandbox: SandboxSpec,
    pub commands: Vec<JobCommand>,
    /// Absolute container paths to extract after the commands complete.
    #[serde(default)]
    pub artifacts: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Lifecycle status of a job.
///
/// QUEUED → RUNNING → one of the terminal states. `Skipped` is produced only
/// by the workflow engine for jobs that never ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Success,
    Failed,
    Cancelled,
    Timeout,
    Error,
    Skipped,
}

impl JobStatus {
    /// Check if this status cannot transition further.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Queued | JobStatus::Running)
    }

    /// Check if this status represents a run that did not succeed.
    ///
    /// Skipped is neither a success nor a failure: the job never ran.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            JobStatus::Failed | JobStatus::Cancelled | JobStatus::Timeout | JobStatus::Error
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Success => write!(f, "success"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
            JobStatus::Timeout => write!(f, "timeout"),
            JobStatus::Error => write!(f, "error"),
            JobStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Result of one executed command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub command: String,
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
    pub duration_seconds: f64,
    pub started_at: DateTime<Utc>,
}

/// Metadata for a file extracted from the container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub name: String,
    pub path: String,
    pub size_bytes: u64,
    pub sha256: String,
}

/// Outcome of the container teardown at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupStatus {
    Ok,
    Failed,
}

/// Persisted history of a single job run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub job_id: String,
    pub status: JobStatus,
    pub image_ref: String,
    /// Container id, assigned after create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sandbox_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub steps: Vec<StepResult>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup_status: Option<CleanupStatus>,
}

impl RunRecord {
    /// Create a fresh QUEUED record for a spec.
    pub fn new(job_id: impl Into<String>, image_ref: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Queued,
            image_ref: image_ref.into(),
            sandbox_id: None,
            created_at: now,
            started_at: None,
            finished_at: None,
            steps: Vec::new(),
            artifacts: Vec::new(),
            error: None,
            cleanup_status: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move the record to a new status, refusing to leave a terminal state.
    ///
    /// Returns `true` if the transition was applied. A terminal status set by
    /// one writer (e.g. cancellation) absorbs later writes by another (e.g.
    /// the runner finishing), so step results and cleanup outcomes merge in
    /// around the winning terminal status instead of overwriting it.
    pub fn transition(&mut self, status: JobStatus, now: DateTime<Utc>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = status;
        match status {
            JobStatus::Running => self.started_at = Some(now),
            s if s.is_terminal() => self.finished_at = Some(now),
            _ => {}
        }
        true
    }

    /// Append an error line, preserving any earlier error text.
    pub fn push_error(&mut self, message: impl AsRef<str>) {
        match &mut self.error {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(message.as_ref());
            }
            None => self.error = Some(message.as_ref().to_string()),
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
