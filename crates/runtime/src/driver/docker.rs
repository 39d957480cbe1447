// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker CLI driver.
//!
//! Shells out to the `docker` binary rather than speaking the engine API
//! directly. Containers are created with a `sleep infinity` holdover process
//! so that `docker exec` has a running target for the job's command list.

use super::{ContainerStats, CreateOpts, DriverError, ExecOutput, RuntimeDriver};
use crate::subprocess::{
    run_with_timeout, CONTAINER_OP_TIMEOUT, COPY_TIMEOUT, PULL_TIMEOUT, STATS_TIMEOUT,
};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Driver backed by the local `docker` CLI.
#[derive(Clone)]
pub struct DockerCliDriver {
    docker_bin: String,
}

impl DockerCliDriver {
    pub fn new() -> Self {
        Self {
            docker_bin: "docker".to_string(),
        }
    }

    /// Use an alternative binary (e.g. `podman`).
    pub fn with_binary(docker_bin: impl Into<String>) -> Self {
        Self {
            docker_bin: docker_bin.into(),
        }
    }

    fn command(&self) -> Command {
        Command::new(&self.docker_bin)
    }
}

impl Default for DockerCliDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the argument list for `docker create` from the create options.
fn create_args(opts: &CreateOpts) -> Vec<String> {
    let mut args = vec!["create".to_string()];
    for (key, value) in &opts.env {
        args.push("--env".to_string());
        args.push(format!("{}={}", key, value));
    }
    if let Some(dir) = &opts.working_dir {
        args.push("--workdir".to_string());
        args.push(dir.clone());
    }
    if let Some(cpus) = opts.resources.cpus {
        args.push("--cpus".to_string());
        args.push(cpus.to_string());
    }
    if let Some(memory_mb) = opts.resources.memory_mb {
        args.push("--memory".to_string());
        args.push(format!("{}m", memory_mb));
    }
    if let Some(pids) = opts.resources.pids_limit {
        args.push("--pids-limit".to_string());
        args.push(pids.to_string());
    }
    for cap in &opts.security.cap_drop {
        args.push("--cap-drop".to_string());
        args.push(cap.clone());
    }
    for opt in &opts.security.security_opt {
        args.push("--security-opt".to_string());
        args.push(opt.clone());
    }
    if opts.security.read_only {
        args.push("--read-only".to_string());
    }
    args.push(opts.image.clone());
    // Holdover process; jobs exec their commands into the container
    args.push("sleep".to_string());
    args.push("infinity".to_string());
    args
}

/// Parse the `CPUPerc` field of `docker stats` output ("12.34%").
fn parse_cpu_percent(raw: &str) -> Option<f64> {
    raw.trim().trim_end_matches('%').parse().ok()
}

#[async_trait]
impl RuntimeDriver for DockerCliDriver {
    async fn pull(&self, image: &str) -> Result<(), DriverError> {
        debug!(image, "pulling image");
        let mut cmd = self.command();
        cmd.args(["pull", image]);
        let output = run_with_timeout(cmd, PULL_TIMEOUT, "docker pull")
            .await
            .map_err(DriverError::Pull)?;
        if !output.status.success() {
            return Err(DriverError::Pull(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }

    async fn create(&self, opts: &CreateOpts) -> Result<String, DriverError> {
        let mut cmd = self.command();
        cmd.args(create_args(opts));
        let output = run_with_timeout(cmd, CONTAINER_OP_TIMEOUT, "docker create")
            .await
            .map_err(DriverError::Create)?;
        if !output.status.success() {
            return Err(DriverError::Create(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(image = %opts.image, sandbox_id = %id, "created container");
        Ok(id)
    }

    async fn start(&self, id: &str) -> Result<(), DriverError> {
        let mut cmd = self.command();
        cmd.args(["start", id]);
        let output = run_with_timeout(cmd, CONTAINER_OP_TIMEOUT, "docker start")
            .await
            .map_err(DriverError::Start)?;
        if !output.status.success() {
            return Err(DriverError::Start(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }

    async fn exec(
        &self,
        id: &str,
        command: &str,
        timeout: Duration,
    ) -> Result<ExecOutput, DriverError> {
        let mut cmd = self.command();
        cmd.args(["exec", id, "sh", "-c", command]);
        let started = Instant::now();
        let output = match tokio::time::timeout(timeout, {
            cmd.kill_on_drop(true);
            cmd.output()
        })
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(io_err)) => return Err(DriverError::Exec(io_err.to_string())),
            Err(_elapsed) => {
                return Err(DriverError::Timeout {
                    seconds: timeout.as_secs(),
                })
            }
        };
        Ok(ExecOutput {
            exit_code: i64::from(output.status.code().unwrap_or(-1)),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration: started.elapsed(),
        })
    }

    async fn copy_out(&self, id: &str, path: &str) -> Result<Vec<u8>, DriverError> {
        let dest = std::env::temp_dir().join(format!("orcaops-cp-{}", uuid::Uuid::new_v4()));
        let mut cmd = self.command();
        cmd.arg("cp");
        cmd.arg(format!("{}:{}", id, path));
        cmd.arg(&dest);
        let output = run_with_timeout(cmd, COPY_TIMEOUT, "docker cp")
            .await
            .map_err(DriverError::CopyOut)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let _ = tokio::fs::remove_file(&dest).await;
            if stderr.contains("No such container:path") || stderr.contains("Could not find") {
                return Err(DriverError::NotFound(path.to_string()));
            }
            return Err(DriverError::CopyOut(stderr));
        }
        let bytes = tokio::fs::read(&dest)
            .await
            .map_err(|e| DriverError::CopyOut(e.to_string()))?;
        let _ = tokio::fs::remove_file(&dest).await;
        Ok(bytes)
    }

    async fn remove(&self, id: &str, force: bool) -> Result<(), DriverError> {
        let mut cmd = self.command();
        cmd.arg("rm");
        if force {
            cmd.arg("--force");
        }
        cmd.arg(id);
        let output = run_with_timeout(cmd, CONTAINER_OP_TIMEOUT, "docker rm")
            .await
            .map_err(DriverError::Remove)?;
        if !output.status.success() {
            return Err(DriverError::Remove(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }

    async fn stats(&self, id: &str) -> Result<ContainerStats, DriverError> {
        let mut cmd = self.command();
        cmd.args(["stats", "--no-stream", "--format", "{{json .}}", id]);
        let output = run_with_timeout(cmd, STATS_TIMEOUT, "docker stats")
            .await
            .map_err(DriverError::Stats)?;
        if !output.status.success() {
            return Err(DriverError::Stats(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        let raw: serde_json::Value =
            serde_json::from_slice(&output.stdout).map_err(|e| DriverError::Stats(e.to_string()))?;
        let cpu = raw
            .get("CPUPerc")
            .and_then(|v| v.as_str())
            .and_then(parse_cpu_percent)
            .unwrap_or(0.0);
        let memory = raw
            .get("MemUsage")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        Ok(ContainerStats {
            cpu_percent: cpu,
            memory_usage: memory,
        })
    }
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
