// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::job::{JobCommand, JobSpec, SandboxSpec};
use crate::workspace::{
    OwnerType, ResourceLimits, Workspace, WorkspaceId, WorkspaceSettings, WorkspaceStatus,
};

/// Build a minimal job spec with default sandbox settings.
pub fn job_spec(job_id: &str, image: &str, commands: &[&str]) -> JobSpec {
    JobSpec {
        job_id: job_id.to_string(),
        workspace_id: None,
        sandbox: SandboxSpec::new(image),
        commands: commands.iter().map(|c| JobCommand::new(*c)).collect(),
        artifacts: Vec::new(),
        metadata: std::collections::HashMap::new(),
    }
}

/// Build a job spec bound to a workspace.
pub fn workspace_job_spec(
    job_id: &str,
    image: &str,
    commands: &[&str],
    workspace_id: &str,
) -> JobSpec {
    let mut spec = job_spec(job_id, image, commands);
    spec.workspace_id = Some(WorkspaceId::new(workspace_id));
    spec
}

/// Build an active user workspace with the given concurrency limit.
pub fn workspace(id: &str, max_concurrent_jobs: u32) -> Workspace {
    Workspace {
        id: WorkspaceId::new(id),
        name: id.to_string(),
        owner_type: OwnerType::User,
        owner_id: "tester".to_string(),
        limits: ResourceLimits {
            max_concurrent_jobs,
            ..ResourceLimits::default()
        },
        settings: WorkspaceSettings::default(),
        status: WorkspaceStatus::Active,
    }
}
