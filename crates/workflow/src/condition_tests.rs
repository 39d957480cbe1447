// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn statuses(pairs: &[(&str, JobStatus)]) -> impl Fn(&str) -> Option<JobStatus> {
    let map: std::collections::HashMap<String, JobStatus> = pairs
        .iter()
        .map(|(name, status)| (name.to_string(), *status))
        .collect();
    move |name: &str| map.get(name).copied()
}

#[parameterized(
    quoted_single = { "build.status == 'success'" },
    quoted_double = { "build.status == \"success\"" },
    bare = { "build.status == success" },
    uppercase_literal = { "build.status == SUCCESS" },
)]
fn equality_matches_success(expr: &str) {
    let cond = Condition::parse(expr).unwrap();
    let lookup = statuses(&[("build", JobStatus::Success)]);
    assert!(cond.eval(&lookup));
}

#[test]
fn equality_fails_on_other_status() {
    let cond = Condition::parse("build.status == 'success'").unwrap();
    let lookup = statuses(&[("build", JobStatus::Failed)]);
    assert!(!cond.eval(&lookup));
}

#[test]
fn negation() {
    let cond = Condition::parse("build.status != 'failed'").unwrap();
    assert!(cond.eval(&statuses(&[("build", JobStatus::Success)])));
    assert!(!cond.eval(&statuses(&[("build", JobStatus::Failed)])));
}

#[test]
fn and_requires_both() {
    let cond =
        Condition::parse("build.status == 'success' && lint.status == 'success'").unwrap();
    assert!(cond.eval(&statuses(&[
        ("build", JobStatus::Success),
        ("lint", JobStatus::Success)
    ])));
    assert!(!cond.eval(&statuses(&[
        ("build", JobStatus::Success),
        ("lint", JobStatus::Failed)
    ])));
}

#[test]
fn or_requires_either() {
    let cond =
        Condition::parse("build.status == 'success' || build.status == 'skipped'").unwrap();
    assert!(cond.eval(&statuses(&[("build", JobStatus::Skipped)])));
    assert!(!cond.eval(&statuses(&[("build", JobStatus::Failed)])));
}

#[test]
fn and_binds_tighter_than_or() {
    // a || (b && c)
    let cond = Condition::parse(
        "a.status == 'success' || b.status == 'success' && c.status == 'success'",
    )
    .unwrap();
    assert!(cond.eval(&statuses(&[
        ("a", JobStatus::Failed),
        ("b", JobStatus::Success),
        ("c", JobStatus::Success)
    ])));
    assert!(!cond.eval(&statuses(&[
        ("a", JobStatus::Failed),
        ("b", JobStatus::Success),
        ("c", JobStatus::Failed)
    ])));
}

#[test]
fn unknown_job_compares_as_not_equal() {
    let cond = Condition::parse("missing.status == 'success'").unwrap();
    assert!(!cond.eval(&statuses(&[])));
    let negated = Condition::parse("missing.status != 'success'").unwrap();
    assert!(negated.eval(&statuses(&[])));
}

#[test]
fn referenced_jobs_are_reported() {
    let cond =
        Condition::parse("build.status == 'success' && lint.status != 'failed'").unwrap();
    let jobs: Vec<&str> = cond.referenced_jobs().collect();
    assert_eq!(jobs, ["build", "lint"]);
}

#[parameterized(
    empty = { "" },
    no_operator = { "build.status" },
    missing_status_suffix = { "build == 'success'" },
    missing_literal = { "build.status == " },
    bad_operator = { "build.status >> 'success'" },
)]
fn malformed_expressions_rejected(expr: &str) {
    assert!(Condition::parse(expr).is_err(), "should reject: {expr}");
}
