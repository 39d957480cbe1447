// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace identity, limits, and settings.
//!
//! A workspace is the tenancy boundary for quota accounting and the policy
//! overlay. Jobs submitted without a workspace bypass quota entirely.

use serde::{Deserialize, Serialize};
use std::fmt;

crate::define_id! {
    /// Unique identifier for a workspace (tenant).
    pub struct WorkspaceId;
}

/// Who owns a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerType {
    User,
    Team,
    Service,
}

fn default_max_concurrent_jobs() -> u32 {
    5
}

fn default_max_concurrent_sandboxes() -> u32 {
    10
}

/// Count-based quota limits for a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: u32,
    #[serde(default = "default_max_concurrent_sandboxes")]
    pub max_concurrent_sandboxes: u32,
    /// Jobs admitted per UTC calendar day. `None` = unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_job_limit: Option<u32>,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
            max_concurrent_sandboxes: default_max_concurrent_sandboxes(),
            daily_job_limit: None,
        }
    }
}

/// Per-workspace policy overlay, merged into the global policy at admission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    #[serde(default)]
    pub allowed_images: Vec<String>,
    #[serde(default)]
    pub blocked_images: Vec<String>,
}

/// Lifecycle status of a workspace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceStatus {
    #[default]
    Active,
    Suspended,
}

impl fmt::Display for WorkspaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkspaceStatus::Active => write!(f, "active"),
            WorkspaceStatus::Suspended => write!(f, "suspended"),
        }
    }
}

/// A registered tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    pub owner_type: OwnerType,
    pub owner_id: String,
    #[serde(default)]
    pub limits: ResourceLimits,
    #[serde(default)]
    pub settings: WorkspaceSettings,
    #[serde(default)]
    pub status: WorkspaceStatus,
}

/// Point-in-time usage snapshot for a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceUsage {
    pub workspace_id: WorkspaceId,
    pub current_running_jobs: u32,
    pub current_running_sandboxes: u32,
    pub jobs_today: u32,
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
