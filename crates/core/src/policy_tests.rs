// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn container_security_defaults_drop_all_caps() {
    let sec = ContainerSecurity::default();
    assert_eq!(sec.cap_drop, vec!["ALL"]);
    assert!(sec
        .security_opt
        .contains(&"no-new-privileges:true".to_string()));
    assert!(!sec.read_only);
}

#[test]
fn empty_policy_deserializes_with_defaults() {
    let policy: SecurityPolicy = serde_json::from_str("{}").unwrap();
    assert!(policy.image_policy.allowed_images.is_empty());
    assert!(policy.image_policy.blocked_images.is_empty());
    assert!(!policy.image_policy.require_digest);
    assert!(policy.command_policy.blocked_commands.is_empty());
}

#[test]
fn policy_result_allowed_iff_no_violations() {
    let ok = PolicyResult::new(Vec::new(), "image_policy");
    assert!(ok.allowed);

    let denied = PolicyResult::new(vec!["blocked".to_string()], "image_policy");
    assert!(!denied.allowed);
    assert_eq!(denied.policy_name, "image_policy");
}
