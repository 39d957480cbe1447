// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow definition types and YAML parsing.

use crate::condition::Condition;
use crate::graph;
use crate::WorkflowError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One job node in a workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowJobSpec {
    pub image: String,
    pub commands: Vec<String>,
    #[serde(default)]
    pub env: IndexMap<String, String>,
    #[serde(default)]
    pub artifacts: Vec<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Condition over upstream job statuses. Absent = always run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    #[serde(default)]
    pub continue_on_error: bool,
}

/// A parsed workflow definition: a named DAG of jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowSpec {
    pub name: String,
    pub jobs: IndexMap<String, WorkflowJobSpec>,
}

impl WorkflowSpec {
    /// Parse and validate a workflow from YAML.
    pub fn from_yaml(source: &str) -> Result<Self, WorkflowError> {
        let spec: WorkflowSpec = serde_yaml::from_str(source)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Validate structure: jobs present, dependencies declared, graph
    /// acyclic, conditions parseable and referencing declared jobs.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.jobs.is_empty() {
            return Err(WorkflowError::Empty);
        }
        for (name, job) in &self.jobs {
            for dependency in &job.depends_on {
                if dependency == name {
                    return Err(WorkflowError::SelfDependency(name.clone()));
                }
                if !self.jobs.contains_key(dependency) {
                    return Err(WorkflowError::UnknownDependency {
                        job: name.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
            if let Some(when) = &job.when {
                let condition =
                    Condition::parse(when).map_err(|message| WorkflowError::Condition {
                        job: name.clone(),
                        message,
                    })?;
                for referenced in condition.referenced_jobs() {
                    if !self.jobs.contains_key(referenced) {
                        return Err(WorkflowError::Condition {
                            job: name.clone(),
                            message: format!("references undeclared job '{}'", referenced),
                        });
                    }
                }
            }
        }
        graph::topological_order(self).map(|_| ())
    }
}

#[cfg(test)]
#[path = "spec_tests.rs"]
mod tests;
