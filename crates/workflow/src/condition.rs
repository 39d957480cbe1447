// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `when` condition expressions.
//!
//! Conditions gate workflow jobs on upstream statuses, e.g.:
//!
//! ```text
//! build.status == 'success'
//! build.status != 'failed' && lint.status == 'success'
//! deploy.status == 'success' || deploy.status == 'skipped'
//! ```
//!
//! Grammar: comparisons on `<job>.status` with `==`/`!=`, joined by `&&`
//! and `||` (`&&` binds tighter). Status literals may be quoted or bare and
//! compare case-insensitively. No parentheses.

use orca_core::JobStatus;

/// One `<job>.status ==/!= <literal>` comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub job: String,
    pub negated: bool,
    pub status: String,
}

impl Comparison {
    fn parse(source: &str) -> Result<Self, String> {
        let (negated, lhs, rhs) = if let Some((lhs, rhs)) = source.split_once("==") {
            (false, lhs, rhs)
        } else if let Some((lhs, rhs)) = source.split_once("!=") {
            (true, lhs, rhs)
        } else {
            return Err(format!("expected '==' or '!=' in '{}'", source.trim()));
        };

        let lhs = lhs.trim();
        let job = lhs
            .strip_suffix(".status")
            .ok_or_else(|| format!("left side must be '<job>.status', got '{}'", lhs))?
            .trim();
        if job.is_empty() {
            return Err("missing job name before '.status'".to_string());
        }

        let status = rhs.trim().trim_matches('\'').trim_matches('"').trim();
        if status.is_empty() {
            return Err(format!("missing status literal in '{}'", source.trim()));
        }

        Ok(Self {
            job: job.to_string(),
            negated,
            status: status.to_ascii_lowercase(),
        })
    }

    fn eval(&self, lookup: &dyn Fn(&str) -> Option<JobStatus>) -> bool {
        let actual = lookup(&self.job).map(|status| status.to_string());
        let matches = actual.as_deref() == Some(self.status.as_str());
        if self.negated {
            !matches
        } else {
            matches
        }
    }
}

/// A parsed `when` expression: an OR of AND-clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    clauses: Vec<Vec<Comparison>>,
}

impl Condition {
    pub fn parse(source: &str) -> Result<Self, String> {
        if source.trim().is_empty() {
            return Err("empty condition".to_string());
        }
        let clauses = source
            .split("||")
            .map(|clause| clause.split("&&").map(Comparison::parse).collect())
            .collect::<Result<Vec<Vec<Comparison>>, String>>()?;
        Ok(Self { clauses })
    }

    /// Evaluate against the current job statuses. A referenced job with no
    /// status yet compares as not-equal to everything.
    pub fn eval(&self, lookup: &dyn Fn(&str) -> Option<JobStatus>) -> bool {
        self.clauses
            .iter()
            .any(|clause| clause.iter().all(|cmp| cmp.eval(lookup)))
    }

    /// Job names this condition reads, for validation against declared jobs.
    pub fn referenced_jobs(&self) -> impl Iterator<Item = &str> {
        self.clauses
            .iter()
            .flat_map(|clause| clause.iter().map(|cmp| cmp.job.as_str()))
    }
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
