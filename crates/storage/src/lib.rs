// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orca-storage: Durable run, workflow, and audit persistence
//!
//! On-disk layout under the output root (default `~/.orcaops/artifacts`):
//!
//! ```text
//! <root>/<job_id>/run.json            RunRecord
//! <root>/<job_id>/steps.jsonl         optional per-step log
//! <root>/<job_id>/<artifact-name>     extracted artifact bytes
//! <root>/workflows/<workflow_id>.json WorkflowRecord
//! <root>/audit/YYYY-MM-DD.log         append-only JSONL audit events
//! ```

mod audit;
mod run_store;
mod workflow_store;

pub use audit::{AuditLog, AuditQuery};
pub use run_store::RunStore;
pub use workflow_store::WorkflowStore;

use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write JSON atomically (write to .tmp, sync, then rename).
///
/// A crash mid-write leaves the previous file intact, never a torn one.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}
