// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn limits_defaults() {
    let limits = ResourceLimits::default();
    assert_eq!(limits.max_concurrent_jobs, 5);
    assert_eq!(limits.max_concurrent_sandboxes, 10);
    assert!(limits.daily_job_limit.is_none());
}

#[test]
fn workspace_deserializes_with_default_limits_and_status() {
    let ws: Workspace = serde_json::from_str(
        r#"{"id": "ws-1", "name": "dev", "owner_type": "user", "owner_id": "alice"}"#,
    )
    .unwrap();
    assert_eq!(ws.id, "ws-1");
    assert_eq!(ws.status, WorkspaceStatus::Active);
    assert_eq!(ws.limits.max_concurrent_jobs, 5);
    assert!(ws.settings.blocked_images.is_empty());
}

#[test]
fn status_display() {
    assert_eq!(WorkspaceStatus::Active.to_string(), "active");
    assert_eq!(WorkspaceStatus::Suspended.to_string(), "suspended");
}
