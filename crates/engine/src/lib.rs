// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orca-engine: Admission, execution, and workflow orchestration
//!
//! The engine ties the data model to the container runtime: the
//! [`JobManager`] runs the admission pipeline (policy, then quota) and owns
//! one worker task per admitted job; the [`JobRunner`] drives a single job
//! through its container lifecycle; the [`WorkflowEngine`] schedules DAGs of
//! jobs through the same admission path.

mod cancel;
mod error;
mod manager;
mod policy;
mod quota;
mod runner;
mod workflow;
mod workspace;

pub use cancel::CancelToken;
pub use error::{SubmitError, WorkflowSubmitError};
pub use manager::JobManager;
pub use policy::PolicyEngine;
pub use quota::{QuotaTracker, ResourceKind};
pub use runner::JobRunner;
pub use workflow::WorkflowEngine;
pub use workspace::WorkspaceRegistry;

use orca_core::RunRecord;
use parking_lot::Mutex;
use std::sync::Arc;

/// Run record shared between the manager (cancellation) and the runner.
///
/// Terminal writes go through [`RunRecord::transition`], so whichever writer
/// reaches a terminal state first wins and later writers merge around it.
pub type SharedRecord = Arc<Mutex<RunRecord>>;
