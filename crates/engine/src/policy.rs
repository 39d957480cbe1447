// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Policy evaluation.
//!
//! Pure functions over (policy, workspace settings, spec): no I/O and no
//! side effects, so the manager can evaluate before touching quota. All
//! violations are accumulated rather than short-circuited, so callers can
//! surface the complete set.

use orca_core::{ContainerSecurity, JobSpec, PolicyResult, SecurityPolicy, WorkspaceSettings};

/// Marker a pinned image reference must contain.
const DIGEST_DELIMITER: &str = "@sha256:";

/// Validates jobs against a security policy.
pub struct PolicyEngine {
    policy: SecurityPolicy,
}

impl PolicyEngine {
    pub fn new(policy: SecurityPolicy) -> Self {
        Self { policy }
    }

    /// Hardening options to inject into admitted specs.
    pub fn container_security(&self) -> &ContainerSecurity {
        &self.policy.container_security
    }

    /// Validate an entire job spec: the image once, each command in order.
    pub fn validate_job(&self, spec: &JobSpec, settings: Option<&WorkspaceSettings>) -> PolicyResult {
        let mut violations = Vec::new();
        violations.extend(self.validate_image(&spec.sandbox.image, settings).violations);
        for command in &spec.commands {
            violations.extend(self.validate_command(&command.command).violations);
        }
        PolicyResult::new(violations, "job_validation")
    }

    /// Check an image against the allow/block lists, with any workspace
    /// overlay merged in. Blocked patterns win over allowed ones; an empty
    /// allowed list permits everything.
    pub fn validate_image(&self, image: &str, settings: Option<&WorkspaceSettings>) -> PolicyResult {
        let ip = &self.policy.image_policy;
        let mut allowed: Vec<&String> = ip.allowed_images.iter().collect();
        let mut blocked: Vec<&String> = ip.blocked_images.iter().collect();
        if let Some(settings) = settings {
            allowed.extend(&settings.allowed_images);
            blocked.extend(&settings.blocked_images);
        }

        let mut violations = Vec::new();
        for pattern in &blocked {
            if glob_match(pattern, image) {
                violations.push(format!(
                    "Image '{}' is blocked by pattern '{}'",
                    image, pattern
                ));
            }
        }
        if !allowed.is_empty() && !allowed.iter().any(|pattern| glob_match(pattern, image)) {
            violations.push(format!("Image '{}' not in allowed list: {:?}", image, allowed));
        }
        if ip.require_digest && !image.contains(DIGEST_DELIMITER) {
            violations.push(format!(
                "Image '{}' must specify a digest (image@sha256:...)",
                image
            ));
        }
        PolicyResult::new(violations, "image_policy")
    }

    /// Check a command against the blocked list (exact, whitespace-trimmed)
    /// and blocked patterns (regex search). Invalid patterns are ignored.
    pub fn validate_command(&self, command: &str) -> PolicyResult {
        let cp = &self.policy.command_policy;
        let mut violations = Vec::new();
        for blocked in &cp.blocked_commands {
            if command.trim() == blocked.trim() {
                violations.push(format!("Command matches blocked command: '{}'", blocked));
            }
        }
        for pattern in &cp.blocked_patterns {
            if let Ok(re) = regex::Regex::new(pattern) {
                if re.is_match(command) {
                    violations.push(format!("Command matches blocked pattern: '{}'", pattern));
                }
            }
        }
        PolicyResult::new(violations, "command_policy")
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new(SecurityPolicy::default())
    }
}

/// fnmatch-style glob test. An unparseable pattern matches nothing.
fn glob_match(pattern: &str, value: &str) -> bool {
    glob::Pattern::new(pattern)
        .map(|p| p.matches(value))
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
