// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow failure propagation and cancellation.

use crate::prelude::*;
use orca_core::{JobStatus, WorkflowStatus};
use orca_runtime::FakeExecResult;
use orca_workflow::WorkflowSpec;
use std::time::Duration;

#[tokio::test]
async fn failed_build_skips_test_and_fails_the_workflow() {
    let h = harness();
    let spec = WorkflowSpec::from_yaml(
        r#"
name: chain
jobs:
  build:
    image: alpine
    commands: ["false"]
  test:
    image: alpine
    commands: [echo testing]
    depends_on: [build]
"#,
    )
    .unwrap();
    h.engine
        .submit_workflow(spec, Some("wf-1".to_string()), None, "spec")
        .unwrap();
    let record = wait_workflow(&h, "wf-1").await;

    assert_eq!(record.status, WorkflowStatus::Failed);
    assert_eq!(record.job_statuses["build"].status, JobStatus::Failed);
    // Skipped is terminal, not success; the job never reached the runtime
    assert_eq!(record.job_statuses["test"].status, JobStatus::Skipped);
    assert!(record.job_statuses["test"].job_id.is_none());
    assert_eq!(h.driver.exec_commands(), ["false"]);
}

#[tokio::test]
async fn surviving_branch_makes_partial_success() {
    let h = harness();
    let spec = WorkflowSpec::from_yaml(
        r#"
name: branches
jobs:
  flaky:
    image: alpine
    commands: ["false"]
  solid:
    image: alpine
    commands: [echo solid]
"#,
    )
    .unwrap();
    h.engine
        .submit_workflow(spec, Some("wf-1".to_string()), None, "spec")
        .unwrap();
    let record = wait_workflow(&h, "wf-1").await;

    assert_eq!(record.status, WorkflowStatus::PartialSuccess);
}

#[tokio::test]
async fn cyclic_workflow_is_rejected_before_any_job_is_submitted() {
    let h = harness();
    let err = WorkflowSpec::from_yaml(
        r#"
name: cyclic
jobs:
  a:
    image: alpine
    commands: [echo a]
    depends_on: [b]
  b:
    image: alpine
    commands: [echo b]
    depends_on: [a]
"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("cycle"));

    // Nothing reached the engine or the runtime
    assert!(h.driver.calls().is_empty());
    assert!(h.manager.list(None).is_empty());
}

#[tokio::test]
async fn cancelling_a_workflow_settles_every_child() {
    let h = harness();
    h.driver.set_exec("sleep 600", FakeExecResult::HangUntilRemoved);
    let spec = WorkflowSpec::from_yaml(
        r#"
name: cancellable
jobs:
  long:
    image: alpine
    commands: [sleep 600]
  after:
    image: alpine
    commands: [echo after]
    depends_on: [long]
"#,
    )
    .unwrap();
    h.engine
        .submit_workflow(spec, Some("wf-1".to_string()), None, "spec")
        .unwrap();

    for _ in 0..600 {
        if h.manager.get("wf-wf-1-long").map(|r| r.status) == Some(JobStatus::Running) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let (ok, _) = h.engine.cancel_workflow("wf-1");
    assert!(ok);
    let record = wait_workflow(&h, "wf-1").await;

    assert_eq!(record.status, WorkflowStatus::Cancelled);
    assert_eq!(record.job_statuses["long"].status, JobStatus::Cancelled);
    assert_eq!(record.job_statuses["after"].status, JobStatus::Cancelled);

    // The cancelled child is a real cancelled job
    let child = h.manager.get("wf-wf-1-long").unwrap();
    assert_eq!(child.status, JobStatus::Cancelled);
}
