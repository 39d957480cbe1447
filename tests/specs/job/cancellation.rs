// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellation semantics: cooperative, preemptive, idempotent.

use crate::prelude::*;
use orca_core::test_support::{workspace, workspace_job_spec};
use orca_core::{JobStatus, WorkspaceId};
use orca_runtime::FakeExecResult;
use std::time::Duration;

async fn submit_hanging_job(h: &Harness) {
    h.registry.register(workspace("ws1", 5));
    h.driver.set_exec("sleep 600", FakeExecResult::HangUntilRemoved);
    h.manager
        .submit(workspace_job_spec("j1", "alpine", &["sleep 600"], "ws1"))
        .unwrap();
    for _ in 0..600 {
        if h.manager.get("j1").map(|r| r.status) == Some(JobStatus::Running) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job never started running");
}

#[tokio::test]
async fn cancel_interrupts_a_running_job() {
    let h = harness();
    submit_hanging_job(&h).await;

    let (ok, record) = h.manager.cancel("j1").await;
    assert!(ok);
    let record = record.unwrap();
    assert_eq!(record.status, JobStatus::Cancelled);
    assert_eq!(record.error.as_deref(), Some("Job cancelled by user."));

    // The worker settles without flipping the status, and the container
    // was force-removed
    let terminal = wait_job(&h, "j1").await;
    assert_eq!(terminal.status, JobStatus::Cancelled);
    assert!(h.driver.was_removed("sandbox-1"));
}

#[tokio::test]
async fn cancel_twice_returns_the_same_terminal_record() {
    let h = harness();
    submit_hanging_job(&h).await;

    let (_, first) = h.manager.cancel("j1").await;
    let (ok, second) = h.manager.cancel("j1").await;
    assert!(ok);
    let (first, second) = (first.unwrap(), second.unwrap());
    assert_eq!(first.status, second.status);
    assert_eq!(first.finished_at, second.finished_at);
    assert_eq!(first.error, second.error);
}

#[tokio::test]
async fn cancelled_job_releases_its_quota() {
    let h = harness();
    submit_hanging_job(&h).await;

    h.manager.cancel("j1").await;
    wait_job(&h, "j1").await;
    wait_quota_released(&h, "ws1").await;

    let usage = h.quota.get_usage(&WorkspaceId::new("ws1"));
    assert_eq!(usage.current_running_jobs, 0);
    assert_eq!(usage.current_running_sandboxes, 0);
}

#[tokio::test]
async fn cancelled_record_is_persisted() {
    let h = harness();
    submit_hanging_job(&h).await;
    h.manager.cancel("j1").await;
    wait_job(&h, "j1").await;

    let stored = h.store.get("j1").unwrap();
    assert_eq!(stored.status, JobStatus::Cancelled);
    assert!(stored.finished_at.is_some());
}
