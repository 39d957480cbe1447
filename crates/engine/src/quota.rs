// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-workspace quota accounting.
//!
//! A single mutex guards all counters; no lock is held across I/O. The
//! admission pipeline uses [`QuotaTracker::check_and_reserve_job`] so that
//! two concurrent submits cannot both observe `N-1` running jobs and both
//! take slot `N`.

use orca_core::{Clock, ResourceLimits, SystemClock, WorkspaceId, WorkspaceUsage};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Which counter a limit check applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Job,
    Sandbox,
}

#[derive(Default)]
struct QuotaState {
    running_jobs: HashMap<WorkspaceId, HashSet<String>>,
    running_sandboxes: HashMap<WorkspaceId, HashSet<String>>,
    /// workspace -> { YYYY-MM-DD (UTC) -> count }. Buckets only ever grow.
    daily_counts: HashMap<WorkspaceId, HashMap<String, u32>>,
}

impl QuotaState {
    fn running_jobs(&self, workspace_id: &WorkspaceId) -> u32 {
        self.running_jobs
            .get(workspace_id)
            .map_or(0, |jobs| jobs.len() as u32)
    }

    fn running_sandboxes(&self, workspace_id: &WorkspaceId) -> u32 {
        self.running_sandboxes
            .get(workspace_id)
            .map_or(0, |sandboxes| sandboxes.len() as u32)
    }

    fn jobs_on(&self, workspace_id: &WorkspaceId, day: &str) -> u32 {
        self.daily_counts
            .get(workspace_id)
            .and_then(|buckets| buckets.get(day))
            .copied()
            .unwrap_or(0)
    }

    /// First violated limit, if any.
    fn violation(
        &self,
        workspace_id: &WorkspaceId,
        limits: &ResourceLimits,
        kind: ResourceKind,
        today: &str,
    ) -> Option<String> {
        match kind {
            ResourceKind::Job => {
                let current = self.running_jobs(workspace_id);
                if current >= limits.max_concurrent_jobs {
                    return Some(format!(
                        "Concurrent job limit reached: {}/{}",
                        current, limits.max_concurrent_jobs
                    ));
                }
                if let Some(daily_limit) = limits.daily_job_limit {
                    let daily = self.jobs_on(workspace_id, today);
                    if daily >= daily_limit {
                        return Some(format!(
                            "Daily job limit reached: {}/{}",
                            daily, daily_limit
                        ));
                    }
                }
                None
            }
            ResourceKind::Sandbox => {
                let current = self.running_sandboxes(workspace_id);
                if current >= limits.max_concurrent_sandboxes {
                    return Some(format!(
                        "Concurrent sandbox limit reached: {}/{}",
                        current, limits.max_concurrent_sandboxes
                    ));
                }
                None
            }
        }
    }

    fn reserve_job(&mut self, workspace_id: &WorkspaceId, job_id: &str, today: &str) {
        self.running_jobs
            .entry(workspace_id.clone())
            .or_default()
            .insert(job_id.to_string());
        *self
            .daily_counts
            .entry(workspace_id.clone())
            .or_default()
            .entry(today.to_string())
            .or_insert(0) += 1;
    }
}

/// Thread-safe accountant for workspace resource consumption.
pub struct QuotaTracker {
    state: Mutex<QuotaState>,
    clock: Arc<dyn Clock>,
}

impl QuotaTracker {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(QuotaState::default()),
            clock,
        }
    }

    /// Check whether the workspace may start another resource of `kind`.
    ///
    /// Not atomically composed with the `on_*` calls; admission uses
    /// [`check_and_reserve_job`](Self::check_and_reserve_job) instead.
    pub fn check_limits(
        &self,
        workspace_id: &WorkspaceId,
        limits: &ResourceLimits,
        kind: ResourceKind,
    ) -> Result<(), String> {
        let today = self.clock.today();
        match self.state.lock().violation(workspace_id, limits, kind, &today) {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    /// Check job and sandbox limits and reserve a job slot in one critical
    /// section. Every job provisions exactly one sandbox, so the sandbox
    /// ceiling is enforced here as well.
    pub fn check_and_reserve_job(
        &self,
        workspace_id: &WorkspaceId,
        limits: &ResourceLimits,
        job_id: &str,
    ) -> Result<(), String> {
        let today = self.clock.today();
        let mut state = self.state.lock();
        for kind in [ResourceKind::Job, ResourceKind::Sandbox] {
            if let Some(reason) = state.violation(workspace_id, limits, kind, &today) {
                return Err(reason);
            }
        }
        state.reserve_job(workspace_id, job_id, &today);
        Ok(())
    }

    /// Record a job start. Increments today's bucket; the bucket is never
    /// decremented, even when the job ends.
    pub fn on_job_start(&self, workspace_id: &WorkspaceId, job_id: &str) {
        let today = self.clock.today();
        self.state.lock().reserve_job(workspace_id, job_id, &today);
    }

    /// Record a job end. Idempotent; tolerates never-started ids.
    pub fn on_job_end(&self, workspace_id: &WorkspaceId, job_id: &str) {
        let mut state = self.state.lock();
        if let Some(jobs) = state.running_jobs.get_mut(workspace_id) {
            jobs.remove(job_id);
        }
    }

    pub fn on_sandbox_start(&self, workspace_id: &WorkspaceId, sandbox_id: &str) {
        self.state
            .lock()
            .running_sandboxes
            .entry(workspace_id.clone())
            .or_default()
            .insert(sandbox_id.to_string());
    }

    /// Idempotent, like [`on_job_end`](Self::on_job_end).
    pub fn on_sandbox_end(&self, workspace_id: &WorkspaceId, sandbox_id: &str) {
        let mut state = self.state.lock();
        if let Some(sandboxes) = state.running_sandboxes.get_mut(workspace_id) {
            sandboxes.remove(sandbox_id);
        }
    }

    /// Usage snapshot for a workspace.
    pub fn get_usage(&self, workspace_id: &WorkspaceId) -> WorkspaceUsage {
        let today = self.clock.today();
        let state = self.state.lock();
        WorkspaceUsage {
            workspace_id: workspace_id.clone(),
            current_running_jobs: state.running_jobs(workspace_id),
            current_running_sandboxes: state.running_sandboxes(workspace_id),
            jobs_today: state.jobs_on(workspace_id, &today),
        }
    }
}

impl Default for QuotaTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "quota_tests.rs"]
mod tests;
