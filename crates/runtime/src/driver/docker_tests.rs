// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use orca_core::{ContainerSecurity, ResourceSpec};
use yare::parameterized;

fn opts(image: &str) -> CreateOpts {
    CreateOpts {
        image: image.to_string(),
        ..CreateOpts::default()
    }
}

#[test]
fn create_args_end_with_image_and_holdover() {
    let args = create_args(&opts("alpine:3.19"));
    let tail: Vec<&String> = args.iter().rev().take(3).collect();
    assert_eq!(tail, ["infinity", "sleep", "alpine:3.19"]);
    assert_eq!(args[0], "create");
}

#[test]
fn create_args_include_security_opts() {
    let mut o = opts("alpine");
    o.security = ContainerSecurity::default();
    let args = create_args(&o);
    let joined = args.join(" ");
    assert!(joined.contains("--cap-drop ALL"), "got: {}", joined);
    assert!(
        joined.contains("--security-opt no-new-privileges:true"),
        "got: {}",
        joined
    );
    assert!(!joined.contains("--read-only"));
}

#[test]
fn create_args_include_resources_and_env() {
    let mut o = opts("alpine");
    o.env.insert("FOO".to_string(), "bar".to_string());
    o.working_dir = Some("/work".to_string());
    o.resources = ResourceSpec {
        cpus: Some(1.5),
        memory_mb: Some(512),
        pids_limit: Some(64),
    };
    let joined = create_args(&o).join(" ");
    assert!(joined.contains("--env FOO=bar"), "got: {}", joined);
    assert!(joined.contains("--workdir /work"), "got: {}", joined);
    assert!(joined.contains("--cpus 1.5"), "got: {}", joined);
    assert!(joined.contains("--memory 512m"), "got: {}", joined);
    assert!(joined.contains("--pids-limit 64"), "got: {}", joined);
}

#[test]
fn read_only_flag_is_emitted() {
    let mut o = opts("alpine");
    o.security.read_only = true;
    assert!(create_args(&o).contains(&"--read-only".to_string()));
}

#[parameterized(
    plain = { "12.34%", Some(12.34) },
    zero = { "0.00%", Some(0.0) },
    padded = { " 3.5% ", Some(3.5) },
    garbage = { "n/a", None },
)]
fn cpu_percent_parsing(raw: &str, expected: Option<f64>) {
    assert_eq!(parse_cpu_percent(raw), expected);
}
