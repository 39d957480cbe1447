// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::workspace::WorkspaceId;

#[test]
fn workspace_id_display_and_eq() {
    let id = WorkspaceId::new("ws-1");
    assert_eq!(id.to_string(), "ws-1");
    assert_eq!(id, "ws-1");
    assert_eq!(id, WorkspaceId::from("ws-1"));
}

#[test]
fn workspace_id_serde_is_a_bare_string() {
    let id = WorkspaceId::new("ws-1");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"ws-1\"");
    let parsed: WorkspaceId = serde_json::from_str("\"ws-1\"").unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn uuid_gen_produces_unique_ids() {
    let gen = UuidIdGen;
    let a = gen.next();
    let b = gen.next();
    assert_ne!(a, b);
    assert_eq!(a.len(), 36);
}

#[test]
fn sequential_gen_counts_up() {
    let gen = SequentialIdGen::new("job");
    assert_eq!(gen.next(), "job-1");
    assert_eq!(gen.next(), "job-2");

    // Clones share the counter
    let clone = gen.clone();
    assert_eq!(clone.next(), "job-3");
}
