// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow subcommands.

use super::{print_json, Stack, EXIT_INTERRUPTED};
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use orca_core::WorkspaceId;
use orca_workflow::WorkflowSpec;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

const WAIT_POLL: Duration = Duration::from_millis(200);

#[derive(Args)]
pub struct WorkflowArgs {
    #[command(subcommand)]
    pub command: WorkflowCommands,
}

#[derive(Subcommand)]
pub enum WorkflowCommands {
    /// Submit a workflow from a YAML spec and wait for it to finish
    Run {
        /// Path to the workflow YAML file
        file: PathBuf,
        /// Workflow id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
        /// Workspace inherited by all child jobs
        #[arg(long)]
        workspace: Option<String>,
    },
    /// Show a workflow record
    Status { workflow_id: String },
    /// List stored workflows
    List,
    /// Cancel a workflow and its running jobs
    Cancel { workflow_id: String },
}

pub async fn dispatch(stack: &Stack, args: WorkflowArgs) -> Result<ExitCode> {
    match args.command {
        WorkflowCommands::Run {
            file,
            id,
            workspace,
        } => run(stack, &file, id, workspace).await,
        WorkflowCommands::Status { workflow_id } => status(stack, &workflow_id),
        WorkflowCommands::List => list(stack),
        WorkflowCommands::Cancel { workflow_id } => cancel(stack, &workflow_id),
    }
}

async fn run(
    stack: &Stack,
    file: &Path,
    id: Option<String>,
    workspace: Option<String>,
) -> Result<ExitCode> {
    let source = std::fs::read_to_string(file)
        .map_err(|e| anyhow!("cannot read '{}': {}", file.display(), e))?;
    let spec = WorkflowSpec::from_yaml(&source)?;
    let record = stack
        .engine
        .submit_workflow(spec, id, workspace.map(WorkspaceId::new), "cli")
        .map_err(|e| anyhow!("{e}"))?;
    eprintln!("Workflow submitted: {}", record.workflow_id);

    loop {
        if let Some(current) = stack.engine.get_workflow(&record.workflow_id) {
            if current.is_terminal() {
                print_json(&current)?;
                let code: u8 = match current.status {
                    orca_core::WorkflowStatus::Success => 0,
                    _ => 1,
                };
                return Ok(ExitCode::from(code));
            }
        }
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                stack.engine.cancel_workflow(&record.workflow_id);
                eprintln!("Interrupted; workflow {} cancelled", record.workflow_id);
                return Ok(ExitCode::from(EXIT_INTERRUPTED));
            }
            _ = tokio::time::sleep(WAIT_POLL) => {}
        }
    }
}

fn status(stack: &Stack, workflow_id: &str) -> Result<ExitCode> {
    let record = stack
        .engine
        .get_workflow(workflow_id)
        .ok_or_else(|| anyhow!("workflow '{workflow_id}' not found"))?;
    print_json(&record)?;
    Ok(ExitCode::SUCCESS)
}

fn list(stack: &Stack) -> Result<ExitCode> {
    let mut records = stack.engine.list_workflows();
    if records.is_empty() {
        // Fall back to history from previous processes
        let store = orca_storage::WorkflowStore::new(stack.store.root());
        records = store.list(50, 0).0;
    }
    if records.is_empty() {
        eprintln!("No workflows found");
    } else {
        print_json(&records)?;
    }
    Ok(ExitCode::SUCCESS)
}

fn cancel(stack: &Stack, workflow_id: &str) -> Result<ExitCode> {
    let (ok, record) = stack.engine.cancel_workflow(workflow_id);
    if !ok {
        return Err(anyhow!("workflow '{workflow_id}' not found"));
    }
    if let Some(record) = record {
        print_json(&record)?;
    }
    Ok(ExitCode::SUCCESS)
}
