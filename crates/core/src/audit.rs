// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured audit events for admission and lifecycle decisions.

use crate::workspace::WorkspaceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    #[serde(rename = "policy.violation")]
    PolicyViolation,
    #[serde(rename = "quota.denied")]
    QuotaDenied,
    #[serde(rename = "job.submitted")]
    JobSubmitted,
    #[serde(rename = "job.terminal")]
    JobTerminal,
    #[serde(rename = "workflow.submitted")]
    WorkflowSubmitted,
    #[serde(rename = "workflow.terminal")]
    WorkflowTerminal,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditAction::PolicyViolation => write!(f, "policy.violation"),
            AuditAction::QuotaDenied => write!(f, "quota.denied"),
            AuditAction::JobSubmitted => write!(f, "job.submitted"),
            AuditAction::JobTerminal => write!(f, "job.terminal"),
            AuditAction::WorkflowSubmitted => write!(f, "workflow.submitted"),
            AuditAction::WorkflowTerminal => write!(f, "workflow.terminal"),
        }
    }
}

/// How it ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Allowed,
    Denied,
    Error,
}

/// One append-only audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub ts: DateTime<Utc>,
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<WorkspaceId>,
    pub action: AuditAction,
    /// The job or workflow the event is about.
    pub subject: String,
    pub outcome: AuditOutcome,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

impl AuditEvent {
    pub fn new(
        ts: DateTime<Utc>,
        action: AuditAction,
        subject: impl Into<String>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            ts,
            actor: "orcaops".to_string(),
            workspace_id: None,
            action,
            subject: subject.into(),
            outcome,
            details: serde_json::Value::Null,
        }
    }

    pub fn with_workspace(mut self, workspace_id: Option<WorkspaceId>) -> Self {
        self.workspace_id = workspace_id;
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
