// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DAG ordering over workflow jobs.

use crate::spec::WorkflowSpec;
use crate::WorkflowError;
use std::collections::HashMap;

/// Kahn's algorithm over the dependency edges.
///
/// Returns job names in an order where every job appears after all of its
/// dependencies, or [`WorkflowError::Cycle`] naming a job on a cycle. Ties
/// are broken by definition order, so the result is deterministic.
pub fn topological_order(spec: &WorkflowSpec) -> Result<Vec<String>, WorkflowError> {
    let mut in_degree: HashMap<&str, usize> = spec
        .jobs
        .iter()
        .map(|(name, job)| (name.as_str(), job.depends_on.len()))
        .collect();
    // dependency -> dependents
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for (name, job) in &spec.jobs {
        for dependency in &job.depends_on {
            dependents
                .entry(dependency.as_str())
                .or_default()
                .push(name.as_str());
        }
    }

    let mut order = Vec::with_capacity(spec.jobs.len());
    let mut ready: Vec<&str> = spec
        .jobs
        .keys()
        .map(String::as_str)
        .filter(|name| in_degree.get(*name).copied() == Some(0))
        .collect();

    while let Some(name) = ready.first().copied() {
        ready.remove(0);
        order.push(name.to_string());
        for dependent in dependents.remove(name).unwrap_or_default() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.push(dependent);
                }
            }
        }
    }

    if order.len() < spec.jobs.len() {
        let stuck = spec
            .jobs
            .keys()
            .find(|name| !order.contains(name))
            .cloned()
            .unwrap_or_default();
        return Err(WorkflowError::Cycle(stuck));
    }
    Ok(order)
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
