// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-job execution through the full stack.

use crate::prelude::*;
use orca_core::test_support::job_spec;
use orca_core::{CleanupStatus, JobStatus, RunRecord};
use orca_runtime::FakeExecResult;

#[tokio::test]
async fn echo_job_succeeds_with_captured_stdout() {
    let h = harness();
    let queued = h
        .manager
        .submit(job_spec("j1", "alpine", &["echo hi"]))
        .unwrap();
    assert_eq!(queued.status, JobStatus::Queued);

    let record = wait_job(&h, "j1").await;
    assert_eq!(record.status, JobStatus::Success);
    assert_eq!(record.steps.len(), 1);
    assert_eq!(record.steps[0].exit_code, 0);
    assert_eq!(record.steps[0].stdout, "hi\n");
    assert!(record.artifacts.is_empty());
    assert_eq!(record.cleanup_status, Some(CleanupStatus::Ok));
}

#[tokio::test]
async fn fail_fast_chain_stops_after_first_failure() {
    let h = harness();
    h.manager
        .submit(job_spec("j1", "alpine", &["echo a", "false", "echo b"]))
        .unwrap();

    let record = wait_job(&h, "j1").await;
    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(record.steps.len(), 2);
    assert_eq!(record.steps[0].exit_code, 0);
    assert_ne!(record.steps[1].exit_code, 0);
    assert_eq!(h.driver.exec_commands(), ["echo a", "false"]);
}

#[tokio::test]
async fn step_results_appear_in_submission_order() {
    let h = harness();
    h.manager
        .submit(job_spec("j1", "alpine", &["echo 1", "echo 2", "echo 3"]))
        .unwrap();
    let record = wait_job(&h, "j1").await;

    let commands: Vec<&str> = record.steps.iter().map(|s| s.command.as_str()).collect();
    assert_eq!(commands, ["echo 1", "echo 2", "echo 3"]);
    for window in record.steps.windows(2) {
        assert!(window[0].started_at <= window[1].started_at);
    }
}

#[tokio::test]
async fn per_step_timeout_marks_timeout() {
    let h = harness();
    h.driver.set_exec("sleep 999", FakeExecResult::Timeout);
    let mut spec = job_spec("j1", "alpine", &["sleep 999"]);
    spec.commands[0].timeout_s = 30;
    h.manager.submit(spec).unwrap();

    let record = wait_job(&h, "j1").await;
    assert_eq!(record.status, JobStatus::Timeout);
    assert_eq!(record.steps[0].exit_code, -30);
}

#[tokio::test]
async fn artifacts_are_extracted_hashed_and_listed() {
    let h = harness();
    h.driver.put_file("/out/report.txt", b"data");
    let mut spec = job_spec("j1", "alpine", &["echo build"]);
    spec.artifacts = vec!["/out/report.txt".to_string(), "/out/absent.bin".to_string()];
    h.manager.submit(spec).unwrap();

    let record = wait_job(&h, "j1").await;
    // The missing artifact is reported but does not fail the job
    assert_eq!(record.status, JobStatus::Success);
    assert_eq!(record.artifacts.len(), 1);
    assert_eq!(record.artifacts[0].name, "report.txt");
    assert_eq!(record.artifacts[0].size_bytes, 4);
    assert!(record
        .error
        .as_deref()
        .unwrap()
        .contains("/out/absent.bin"));

    assert_eq!(h.manager.list_artifacts("j1"), ["report.txt"]);
    let path = h.manager.get_artifact("j1", "report.txt").unwrap();
    assert_eq!(std::fs::read(path).unwrap(), b"data");
}

#[tokio::test]
async fn terminal_record_round_trips_through_the_store() {
    let h = harness();
    h.manager
        .submit(job_spec("j1", "alpine", &["echo hi"]))
        .unwrap();
    let live = wait_job(&h, "j1").await;

    // What the durable store returns equals the live record
    let stored = h.store.get("j1").unwrap();
    assert_eq!(stored.job_id, live.job_id);
    assert_eq!(stored.status, live.status);
    assert_eq!(stored.created_at, live.created_at);
    assert_eq!(stored.finished_at, live.finished_at);
    assert_eq!(stored.steps, live.steps);

    // And the raw file uses the stable field names
    let raw = std::fs::read_to_string(h.root.join("j1").join("run.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["status"], "success");
    assert_eq!(value["image_ref"], "alpine");

    // A fresh process (empty registry) can still serve the job
    let reparsed: RunRecord = serde_json::from_str(&raw).unwrap();
    assert_eq!(reparsed.status, JobStatus::Success);
}
