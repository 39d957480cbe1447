// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable workflow record storage (`workflows/<workflow_id>.json`).

use crate::{write_json_atomic, StoreError};
use orca_core::WorkflowRecord;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub struct WorkflowStore {
    dir: PathBuf,
}

impl WorkflowStore {
    /// `root` is the shared output root; records land in `<root>/workflows`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            dir: root.into().join("workflows"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, workflow_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", workflow_id))
    }

    pub fn put(&self, record: &WorkflowRecord) -> Result<(), StoreError> {
        write_json_atomic(&self.record_path(&record.workflow_id), record)
    }

    /// Load a record. Missing or corrupt files read as absent.
    pub fn get(&self, workflow_id: &str) -> Option<WorkflowRecord> {
        let bytes = fs::read(self.record_path(workflow_id)).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(workflow_id, error = %e, "corrupt workflow record, treating as absent");
                None
            }
        }
    }

    /// List stored records, newest first, with the total count.
    pub fn list(&self, limit: usize, offset: usize) -> (Vec<WorkflowRecord>, usize) {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return (Vec::new(), 0);
        };
        let mut records: Vec<WorkflowRecord> = entries
            .flatten()
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter_map(|name| name.strip_suffix(".json").map(str::to_string))
            .filter_map(|id| self.get(&id))
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = records.len();
        let page = records.into_iter().skip(offset).take(limit).collect();
        (page, total)
    }
}

#[cfg(test)]
#[path = "workflow_store_tests.rs"]
mod tests;
