// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Security policy types.
//!
//! Policies are pure data; evaluation lives in the engine crate. Image
//! patterns use fnmatch-style globs, command patterns use regex search
//! semantics.

use serde::{Deserialize, Serialize};

/// Allow/block rules for container images.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImagePolicy {
    /// Glob patterns. Empty list permits all images.
    #[serde(default)]
    pub allowed_images: Vec<String>,
    /// Glob patterns. Blocked overrides allowed.
    #[serde(default)]
    pub blocked_images: Vec<String>,
    /// Require images to be pinned to a digest (`image@sha256:...`).
    #[serde(default)]
    pub require_digest: bool,
}

/// Block rules for job commands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandPolicy {
    /// Exact matches, compared whitespace-trimmed.
    #[serde(default)]
    pub blocked_commands: Vec<String>,
    /// Regex patterns, search semantics. Invalid patterns are ignored.
    #[serde(default)]
    pub blocked_patterns: Vec<String>,
}

/// Hardening options applied to every job container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSecurity {
    #[serde(default)]
    pub cap_drop: Vec<String>,
    #[serde(default)]
    pub security_opt: Vec<String>,
    #[serde(default)]
    pub read_only: bool,
}

impl Default for ContainerSecurity {
    fn default() -> Self {
        Self {
            cap_drop: vec!["ALL".to_string()],
            security_opt: vec!["no-new-privileges:true".to_string()],
            read_only: false,
        }
    }
}

/// Complete security policy for job admission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityPolicy {
    #[serde(default)]
    pub image_policy: ImagePolicy,
    #[serde(default)]
    pub command_policy: CommandPolicy,
    #[serde(default)]
    pub container_security: ContainerSecurity,
}

/// Outcome of evaluating a policy against an image, command, or whole job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyResult {
    pub allowed: bool,
    pub violations: Vec<String>,
    pub policy_name: String,
}

impl PolicyResult {
    pub fn new(violations: Vec<String>, policy_name: impl Into<String>) -> Self {
        Self {
            allowed: violations.is_empty(),
            violations,
            policy_name: policy_name.into(),
        }
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
