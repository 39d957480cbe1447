// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job subcommands.

use super::{parse_status, print_json, Stack, EXIT_INTERRUPTED};
use anyhow::{anyhow, Result};
use clap::Args;
use orca_core::{JobCommand, JobSpec, JobStatus, SandboxSpec, WorkspaceId};
use std::collections::HashMap;
use std::process::ExitCode;
use std::time::Duration;

const WAIT_POLL: Duration = Duration::from_millis(200);

#[derive(Args)]
pub struct RunArgs {
    /// Container image to run in
    #[arg(long)]
    pub image: String,

    /// Command to execute; repeat for an ordered list
    #[arg(long = "cmd", required = true)]
    pub commands: Vec<String>,

    /// Job id (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Workspace to account the job against
    #[arg(long)]
    pub workspace: Option<String>,

    /// Environment variable, KEY=VALUE; repeatable
    #[arg(long = "env")]
    pub env: Vec<String>,

    /// Working directory inside the container
    #[arg(long)]
    pub workdir: Option<String>,

    /// Absolute container path to extract after the run; repeatable
    #[arg(long = "artifact")]
    pub artifacts: Vec<String>,
}

pub async fn run(stack: &Stack, args: RunArgs) -> Result<ExitCode> {
    let mut env = HashMap::new();
    for pair in &args.env {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid --env '{pair}', expected KEY=VALUE"))?;
        env.insert(key.to_string(), value.to_string());
    }

    let spec = JobSpec {
        job_id: args.id.unwrap_or_default(),
        workspace_id: args.workspace.map(WorkspaceId::new),
        sandbox: SandboxSpec {
            image: args.image,
            env,
            working_dir: args.workdir,
            resources: Default::default(),
        },
        commands: args.commands.iter().map(JobCommand::new).collect(),
        artifacts: args.artifacts,
        metadata: HashMap::new(),
    };

    let queued = stack.manager.submit(spec).map_err(|e| anyhow!("{e}"))?;
    eprintln!("Submitted job {}", queued.job_id);

    // The worker lives in this process, so stay around until it finishes
    loop {
        if let Some(record) = stack.manager.get(&queued.job_id) {
            if record.is_terminal() {
                print_json(&record)?;
                let code: u8 = if record.status == JobStatus::Success { 0 } else { 1 };
                return Ok(ExitCode::from(code));
            }
        }
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                stack.manager.cancel(&queued.job_id).await;
                eprintln!("Interrupted; job {} cancelled", queued.job_id);
                return Ok(ExitCode::from(EXIT_INTERRUPTED));
            }
            _ = tokio::time::sleep(WAIT_POLL) => {}
        }
    }
}

pub fn show(stack: &Stack, job_id: &str) -> Result<ExitCode> {
    let record = stack
        .manager
        .get(job_id)
        .ok_or_else(|| anyhow!("job '{job_id}' not found"))?;
    print_json(&record)?;
    Ok(ExitCode::SUCCESS)
}

pub fn list(stack: &Stack, status: Option<&str>) -> Result<ExitCode> {
    let status = status.map(parse_status).transpose()?;
    // The CLI is short-lived, so the durable store is the interesting view
    let (records, total) = stack.store.list(status, 50, 0);
    print_json(&records)?;
    if total > records.len() {
        eprintln!("({} of {} shown)", records.len(), total);
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn cancel(stack: &Stack, job_id: &str) -> Result<ExitCode> {
    let (ok, record) = stack.manager.cancel(job_id).await;
    if !ok {
        return Err(anyhow!("job '{job_id}' not found"));
    }
    if let Some(record) = record {
        print_json(&record)?;
    }
    Ok(ExitCode::SUCCESS)
}

pub fn artifacts(stack: &Stack, job_id: &str) -> Result<ExitCode> {
    if stack.manager.get(job_id).is_none() {
        return Err(anyhow!("job '{job_id}' not found"));
    }
    for name in stack.manager.list_artifacts(job_id) {
        println!("{name}");
    }
    Ok(ExitCode::SUCCESS)
}

pub fn usage(stack: &Stack, workspace_id: &str) -> Result<ExitCode> {
    let usage = stack.manager.usage(&WorkspaceId::new(workspace_id));
    print_json(&usage)?;
    Ok(ExitCode::SUCCESS)
}
