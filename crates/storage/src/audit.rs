// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only audit log.
//!
//! One JSONL file per UTC day under `audit/`, named by the event timestamp.
//! Recording never fails the caller: an audit write error must not take the
//! admission pipeline down with it.

use orca_core::{AuditAction, AuditEvent};
use orca_core::WorkspaceId;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Filter for querying recorded events.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub action: Option<AuditAction>,
    pub workspace_id: Option<WorkspaceId>,
    pub subject: Option<String>,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// Append-only JSONL audit sink.
pub struct AuditLog {
    dir: PathBuf,
}

impl AuditLog {
    /// `root` is the shared output root; events land in `<root>/audit`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            dir: root.into().join("audit"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append an event to the day file picked from its timestamp.
    ///
    /// Failures are logged via tracing but do not propagate.
    pub fn record(&self, event: &AuditEvent) {
        if let Err(e) = self.try_record(event) {
            warn!(action = %event.action, subject = %event.subject, error = %e,
                "failed to write audit event");
        }
    }

    fn try_record(&self, event: &AuditEvent) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let day = event.ts.format("%Y-%m-%d");
        let path = self.dir.join(format!("{}.log", day));
        let line = serde_json::to_string(event)?;
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Query recorded events in chronological order.
    ///
    /// Returns the requested page and the total count after filtering.
    /// Unparseable lines are skipped.
    pub fn query(&self, query: &AuditQuery) -> (Vec<AuditEvent>, usize) {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return (Vec::new(), 0);
        };
        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "log"))
            .collect();
        files.sort();

        let mut events = Vec::new();
        for path in files {
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            for line in content.lines() {
                let Ok(event) = serde_json::from_str::<AuditEvent>(line) else {
                    continue;
                };
                if query.action.is_some_and(|a| event.action != a) {
                    continue;
                }
                if let Some(ws) = &query.workspace_id {
                    if event.workspace_id.as_ref() != Some(ws) {
                        continue;
                    }
                }
                if let Some(subject) = &query.subject {
                    if &event.subject != subject {
                        continue;
                    }
                }
                events.push(event);
            }
        }
        let total = events.len();
        let page = events
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();
        (page, total)
    }
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
