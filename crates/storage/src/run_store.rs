// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable run record and artifact storage.
//!
//! One directory per job id, holding `run.json` plus extracted artifact
//! files. Readers tolerate concurrent writers: a torn or corrupt record
//! reads as absent rather than an error.

use crate::{write_json_atomic, StoreError};
use chrono::{DateTime, Duration, Utc};
use orca_core::{JobStatus, RunRecord};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const RUN_RECORD_FILE: &str = "run.json";
/// Reserved for streaming step logs; never listed as an artifact.
const STEP_LOG_FILE: &str = "steps.jsonl";

/// Directories under the root that belong to other stores.
const RESERVED_DIRS: &[&str] = &["workflows", "audit"];

/// Durable store for run records and their artifacts.
pub struct RunStore {
    root: PathBuf,
}

impl RunStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory artifacts for a job are written into.
    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.root.join(job_id)
    }

    /// Persist the record, replacing any previous version.
    pub fn put(&self, record: &RunRecord) -> Result<(), StoreError> {
        let path = self.job_dir(&record.job_id).join(RUN_RECORD_FILE);
        write_json_atomic(&path, record)
    }

    /// Load a record. Missing or corrupt files read as absent.
    pub fn get(&self, job_id: &str) -> Option<RunRecord> {
        let path = self.job_dir(job_id).join(RUN_RECORD_FILE);
        let bytes = fs::read(&path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(job_id, error = %e, "corrupt run record, treating as absent");
                None
            }
        }
    }

    /// List stored records, newest first.
    ///
    /// Returns the requested page and the total count after filtering.
    pub fn list(
        &self,
        status: Option<JobStatus>,
        limit: usize,
        offset: usize,
    ) -> (Vec<RunRecord>, usize) {
        let mut records: Vec<RunRecord> = self
            .job_ids()
            .iter()
            .filter_map(|job_id| self.get(job_id))
            .filter(|record| status.is_none_or(|s| record.status == s))
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = records.len();
        let page = records.into_iter().skip(offset).take(limit).collect();
        (page, total)
    }

    /// Names of extracted artifacts for a job, excluding bookkeeping files.
    pub fn list_artifacts(&self, job_id: &str) -> Vec<String> {
        let dir = self.job_dir(job_id);
        let Ok(entries) = fs::read_dir(&dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name != RUN_RECORD_FILE && name != STEP_LOG_FILE)
            .collect();
        names.sort();
        names
    }

    /// Path to a named artifact, if it exists.
    pub fn get_artifact(&self, job_id: &str, name: &str) -> Option<PathBuf> {
        if name == RUN_RECORD_FILE || name == STEP_LOG_FILE {
            return None;
        }
        let path = self.job_dir(job_id).join(name);
        path.is_file().then_some(path)
    }

    /// Remove job directories whose runs finished more than `older_than_days`
    /// ago. Returns the removed job ids.
    pub fn cleanup(&self, older_than_days: u32, now: DateTime<Utc>) -> Vec<String> {
        let cutoff = now - Duration::days(i64::from(older_than_days));
        let mut removed = Vec::new();
        for job_id in self.job_ids() {
            let Some(record) = self.get(&job_id) else {
                continue;
            };
            if !record.is_terminal() {
                continue;
            }
            let reference = record.finished_at.unwrap_or(record.created_at);
            if reference < cutoff {
                match fs::remove_dir_all(self.job_dir(&job_id)) {
                    Ok(()) => removed.push(job_id),
                    Err(e) => warn!(job_id, error = %e, "failed to remove expired job dir"),
                }
            }
        }
        removed
    }

    fn job_ids(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Vec::new();
        };
        entries
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| !RESERVED_DIRS.contains(&name.as_str()))
            .collect()
    }
}

#[cfg(test)]
#[path = "run_store_tests.rs"]
mod tests;
