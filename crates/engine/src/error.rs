// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for admission and workflow submission.
//!
//! These cover the synchronous rejection paths only: anything that goes
//! wrong after admission is captured in the run record, not raised.

use orca_workflow::WorkflowError;
use thiserror::Error;

/// Why a job submission was rejected. No side effects have occurred when
/// one of these is returned (beyond the audit trail entry).
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("job '{0}' already exists")]
    DuplicateJob(String),
    #[error("workspace '{0}' not found")]
    UnknownWorkspace(String),
    #[error("workspace '{0}' is suspended")]
    SuspendedWorkspace(String),
    #[error("Policy violation: {0}")]
    PolicyViolation(String),
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),
}

/// Why a workflow submission was rejected.
#[derive(Debug, Error)]
pub enum WorkflowSubmitError {
    #[error("workflow '{0}' already exists")]
    DuplicateWorkflow(String),
    #[error(transparent)]
    Invalid(#[from] WorkflowError),
}
