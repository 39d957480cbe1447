// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orca-workflow: Workflow definition parsing and validation
//!
//! Workflows are YAML documents describing a DAG of jobs. Parsing rejects
//! unknown keys; validation rejects unknown dependencies, cycles, and
//! conditions referencing undeclared jobs, all before any job is submitted.

pub mod condition;
pub mod graph;
pub mod spec;

pub use condition::Condition;
pub use graph::topological_order;
pub use spec::{WorkflowJobSpec, WorkflowSpec};

use thiserror::Error;

/// Errors from parsing or validating a workflow definition.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("failed to parse workflow spec: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("workflow has no jobs")]
    Empty,
    #[error("job '{job}' depends on unknown job '{dependency}'")]
    UnknownDependency { job: String, dependency: String },
    #[error("job '{0}' depends on itself")]
    SelfDependency(String),
    #[error("dependency cycle detected involving '{0}'")]
    Cycle(String),
    #[error("invalid condition for job '{job}': {message}")]
    Condition { job: String, message: String },
}
