// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orcaops - container job and workflow orchestrator CLI

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{job, workflow, Stack};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "orcaops",
    version,
    about = "OrcaOps - run declarative jobs and workflows in containers"
)]
struct Cli {
    /// Output root for run records and artifacts (default ~/.orcaops/artifacts)
    #[arg(long, global = true, value_name = "DIR")]
    output_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a job and wait for it to finish
    Run(job::RunArgs),
    /// Show a job's run record
    Show { job_id: String },
    /// List jobs known to the durable store
    List {
        /// Filter by status (queued, running, success, failed, ...)
        #[arg(long)]
        status: Option<String>,
    },
    /// Cancel a job
    Cancel { job_id: String },
    /// List a job's extracted artifacts
    Artifacts { job_id: String },
    /// Show quota usage for a workspace
    Usage { workspace_id: String },
    /// Workflow management
    Workflow(workflow::WorkflowArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = cli
        .output_root
        .clone()
        .unwrap_or_else(commands::default_output_root);

    match dispatch(cli, root).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn dispatch(cli: Cli, root: PathBuf) -> Result<ExitCode> {
    let stack = Stack::new(root);
    match cli.command {
        Commands::Run(args) => job::run(&stack, args).await,
        Commands::Show { job_id } => job::show(&stack, &job_id),
        Commands::List { status } => job::list(&stack, status.as_deref()),
        Commands::Cancel { job_id } => job::cancel(&stack, &job_id).await,
        Commands::Artifacts { job_id } => job::artifacts(&stack, &job_id),
        Commands::Usage { workspace_id } => job::usage(&stack, &workspace_id),
        Commands::Workflow(args) => workflow::dispatch(&stack, args).await,
    }
}
