// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow fan-out, fan-in, and conditional execution.

use crate::prelude::*;
use orca_core::{JobStatus, WorkflowStatus};
use orca_workflow::WorkflowSpec;

#[tokio::test]
async fn fanout_gates_dependents_on_the_shared_dependency() {
    let h = harness();
    let spec = WorkflowSpec::from_yaml(
        r#"
name: build-and-test
jobs:
  build:
    image: alpine
    commands: [echo building]
  test_a:
    image: alpine
    commands: [echo testing a]
    depends_on: [build]
  test_b:
    image: alpine
    commands: [echo testing b]
    depends_on: [build]
"#,
    )
    .unwrap();

    h.engine
        .submit_workflow(spec, Some("wf-1".to_string()), None, "spec")
        .unwrap();
    let record = wait_workflow(&h, "wf-1").await;

    assert_eq!(record.status, WorkflowStatus::Success);
    for name in ["build", "test_a", "test_b"] {
        assert_eq!(record.job_statuses[name].status, JobStatus::Success);
    }
    // build ran strictly before either test branch
    assert_eq!(h.driver.exec_commands()[0], "echo building");

    // Children were real jobs with derived ids
    assert!(h.manager.get("wf-wf-1-build").is_some());
    assert!(h.manager.get("wf-wf-1-test_a").is_some());
}

#[tokio::test]
async fn diamond_fan_in_waits_for_all_branches() {
    let h = harness();
    let spec = WorkflowSpec::from_yaml(
        r#"
name: diamond
jobs:
  build:
    image: alpine
    commands: [echo building]
  test_a:
    image: alpine
    commands: [echo a]
    depends_on: [build]
  test_b:
    image: alpine
    commands: [echo b]
    depends_on: [build]
  publish:
    image: alpine
    commands: [echo publishing]
    depends_on: [test_a, test_b]
"#,
    )
    .unwrap();
    h.engine
        .submit_workflow(spec, Some("wf-1".to_string()), None, "spec")
        .unwrap();
    let record = wait_workflow(&h, "wf-1").await;

    assert_eq!(record.status, WorkflowStatus::Success);
    let commands = h.driver.exec_commands();
    assert_eq!(commands.first().map(String::as_str), Some("echo building"));
    assert_eq!(commands.last().map(String::as_str), Some("echo publishing"));
}

#[tokio::test]
async fn condition_selects_the_branch_that_matches_upstream_status() {
    let h = harness();
    let spec = WorkflowSpec::from_yaml(
        r#"
name: conditional-deploy
jobs:
  build:
    image: alpine
    commands: [echo building]
  deploy:
    image: alpine
    commands: [echo deploying]
    depends_on: [build]
    when: build.status == 'success'
  rollback:
    image: alpine
    commands: [echo rolling back]
    depends_on: [build]
    when: build.status == 'failed'
"#,
    )
    .unwrap();
    h.engine
        .submit_workflow(spec, Some("wf-1".to_string()), None, "spec")
        .unwrap();
    let record = wait_workflow(&h, "wf-1").await;

    assert_eq!(record.job_statuses["deploy"].status, JobStatus::Success);
    assert_eq!(record.job_statuses["rollback"].status, JobStatus::Skipped);
    // A skip chosen by condition still counts as a fully successful run
    assert_eq!(record.status, WorkflowStatus::Success);
}

#[tokio::test]
async fn workflow_jobs_inherit_the_workspace() {
    let h = harness();
    h.registry
        .register(orca_core::test_support::workspace("ws1", 10));
    let spec = WorkflowSpec::from_yaml(
        r#"
name: scoped
jobs:
  only:
    image: alpine
    commands: [echo hi]
"#,
    )
    .unwrap();
    h.engine
        .submit_workflow(
            spec,
            Some("wf-1".to_string()),
            Some(orca_core::WorkspaceId::new("ws1")),
            "spec",
        )
        .unwrap();
    let record = wait_workflow(&h, "wf-1").await;

    assert_eq!(record.status, WorkflowStatus::Success);
    // The child was accounted against the workspace
    assert_eq!(
        h.quota
            .get_usage(&orca_core::WorkspaceId::new("ws1"))
            .jobs_today,
        1
    );
}
