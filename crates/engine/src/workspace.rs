// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory workspace registry.
//!
//! Workspaces are registered by the embedding application (CLI, service);
//! the manager consults the registry during admission for limits, settings,
//! and suspension status.

use orca_core::{Workspace, WorkspaceId};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
pub struct WorkspaceRegistry {
    inner: Mutex<HashMap<WorkspaceId, Workspace>>,
}

impl WorkspaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a workspace.
    pub fn register(&self, workspace: Workspace) {
        self.inner.lock().insert(workspace.id.clone(), workspace);
    }

    pub fn get(&self, id: &WorkspaceId) -> Option<Workspace> {
        self.inner.lock().get(id).cloned()
    }

    pub fn list(&self) -> Vec<Workspace> {
        let mut workspaces: Vec<Workspace> = self.inner.lock().values().cloned().collect();
        workspaces.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        workspaces
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
