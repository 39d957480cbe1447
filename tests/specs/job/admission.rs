// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admission pipeline: policy, quota, audit, and the reservation balance.

use crate::prelude::*;
use orca_core::policy::ImagePolicy;
use orca_core::test_support::{job_spec, workspace, workspace_job_spec};
use orca_core::{AuditAction, AuditOutcome, SecurityPolicy, WorkspaceId};
use orca_runtime::FakeExecResult;
use orca_storage::AuditQuery;

#[tokio::test]
async fn blocked_image_is_rejected_with_audit_and_no_side_effects() {
    let h = harness_with_policy(SecurityPolicy {
        image_policy: ImagePolicy {
            blocked_images: vec!["python:*".to_string()],
            ..ImagePolicy::default()
        },
        ..SecurityPolicy::default()
    });

    let err = h
        .manager
        .submit(job_spec("j1", "python:3.11", &["echo hi"]))
        .unwrap_err();
    assert!(err.to_string().starts_with("Policy violation:"));

    let (events, total) = h.audit.query(&AuditQuery::default());
    assert_eq!(total, 1);
    assert_eq!(events[0].action, AuditAction::PolicyViolation);
    assert_eq!(events[0].outcome, AuditOutcome::Denied);

    // No container activity, no persisted record
    assert!(h.driver.calls().is_empty());
    assert!(h.store.get("j1").is_none());
}

#[tokio::test]
async fn policy_verdict_matches_per_part_validation() {
    let engine = orca_engine::PolicyEngine::new(SecurityPolicy {
        image_policy: ImagePolicy {
            blocked_images: vec!["bad:*".to_string()],
            ..ImagePolicy::default()
        },
        ..SecurityPolicy::default()
    });

    for (image, commands) in [
        ("alpine", vec!["echo hi"]),
        ("bad:latest", vec!["echo hi"]),
        ("alpine", vec!["echo a", "echo b"]),
        ("bad:1", vec!["echo a", "echo b"]),
    ] {
        let spec = job_spec("j", image, &commands);
        let whole = engine.validate_job(&spec, None);
        let parts = engine.validate_image(image, None).allowed
            && commands
                .iter()
                .all(|c| engine.validate_command(c).allowed);
        assert_eq!(whole.allowed, parts, "image={image}");
    }
}

#[tokio::test]
async fn concurrent_limit_rejects_until_slot_frees() {
    let h = harness();
    h.registry.register(workspace("ws1", 1));
    h.driver.set_exec("sleep 600", FakeExecResult::HangUntilRemoved);

    h.manager
        .submit(workspace_job_spec("j1", "alpine", &["sleep 600"], "ws1"))
        .unwrap();

    // Reservation is visible immediately after submit
    assert_eq!(
        h.quota
            .get_usage(&WorkspaceId::new("ws1"))
            .current_running_jobs,
        1
    );

    let err = h
        .manager
        .submit(workspace_job_spec("j2", "alpine", &["echo hi"], "ws1"))
        .unwrap_err();
    assert!(err.to_string().contains("Concurrent job limit"));

    // Free the slot; a new job is admitted
    h.manager.cancel("j1").await;
    wait_quota_released(&h, "ws1").await;
    h.manager
        .submit(workspace_job_spec("j3", "alpine", &["echo hi"], "ws1"))
        .unwrap();
    wait_job(&h, "j3").await;
}

#[tokio::test]
async fn reservation_is_balanced_across_the_job_lifetime() {
    let h = harness();
    h.registry.register(workspace("ws1", 5));

    for i in 0..3 {
        h.manager
            .submit(workspace_job_spec(
                &format!("j{i}"),
                "alpine",
                &["echo hi"],
                "ws1",
            ))
            .unwrap();
    }
    for i in 0..3 {
        wait_job(&h, &format!("j{i}")).await;
    }
    wait_quota_released(&h, "ws1").await;

    let usage = h.quota.get_usage(&WorkspaceId::new("ws1"));
    assert_eq!(usage.current_running_jobs, 0);
    assert_eq!(usage.current_running_sandboxes, 0);
    // The daily bucket never decreases
    assert_eq!(usage.jobs_today, 3);
}

#[tokio::test]
async fn quota_denial_is_audited_with_reason() {
    let h = harness();
    let mut ws = workspace("ws1", 5);
    ws.limits.daily_job_limit = Some(1);
    h.registry.register(ws);

    h.manager
        .submit(workspace_job_spec("j0", "alpine", &["echo hi"], "ws1"))
        .unwrap();
    wait_job(&h, "j0").await;

    let err = h
        .manager
        .submit(workspace_job_spec("j1", "alpine", &["echo hi"], "ws1"))
        .unwrap_err();
    assert!(err.to_string().contains("Daily job limit"));

    let (events, total) = h.audit.query(&AuditQuery {
        action: Some(AuditAction::QuotaDenied),
        ..AuditQuery::default()
    });
    assert_eq!(total, 1);
    assert_eq!(
        events[0].workspace_id.as_ref().map(|w| w.as_str()),
        Some("ws1")
    );

    // Daily buckets are keyed by UTC date: the next day admits again
    h.clock.advance_days(1);
    h.manager
        .submit(workspace_job_spec("j2", "alpine", &["echo hi"], "ws1"))
        .unwrap();
    wait_job(&h, "j2").await;
}
