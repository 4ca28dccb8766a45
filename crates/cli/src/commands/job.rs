// SPDX-License-Identifier: MIT

//! `lightsched job` — submit, list, inspect, delete, and terminate jobs.

use crate::client::ApiClient;
use crate::output::{print, OutputFormat, Table};
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use lightsched_wire::JobSpec;
use std::path::PathBuf;

#[derive(Args)]
pub struct JobArgs {
    #[command(subcommand)]
    pub command: JobCommand,
}

#[derive(Subcommand)]
pub enum JobCommand {
    /// List jobs, optionally filtered by state
    List {
        #[arg(long)]
        state: Option<String>,
    },
    /// Show a single job's details
    Show { id: String },
    /// Submit a job from a JSON spec file
    Submit {
        /// Path to a `JobSpec` JSON document
        file: PathBuf,
    },
    /// Delete a finished job and its workspace
    Delete { id: String },
    /// Terminate a running job
    Terminate { id: String },
}

pub async fn run(client: &ApiClient, args: JobArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        JobCommand::List { state } => {
            let jobs = client.list_jobs(state.as_deref()).await?;
            print(&jobs, format, |jobs| {
                let mut table = Table::new(vec!["ID", "NAME", "QUEUE", "STATE", "PROGRESS"]);
                for job in jobs {
                    table.push(vec![
                        job.id.clone(),
                        job.name.clone(),
                        job.queue.clone(),
                        format!("{:?}", job.state),
                        format!("{}%", job.progress),
                    ]);
                }
                table.print();
            });
        }
        JobCommand::Show { id } => {
            let job = client.get_job(&id).await?;
            print(&job, format, |job| {
                println!("id:       {}", job.id);
                println!("name:     {}", job.name);
                println!("queue:    {}", job.queue);
                println!("state:    {:?}", job.state);
                println!("progress: {}%", job.progress);
                println!("tasks:    {}", job.total_tasks);
            });
        }
        JobCommand::Submit { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let spec: JobSpec = serde_json::from_str(&text)
                .with_context(|| format!("parsing {} as a job spec", file.display()))?;
            let job = client.submit_job(&spec).await?;
            println!("submitted job {}", job.id);
        }
        JobCommand::Delete { id } => {
            client.delete_job(&id).await?;
            println!("deleted job {id}");
        }
        JobCommand::Terminate { id } => {
            client.terminate_job(&id).await?;
            println!("terminating job {id}");
        }
    }
    Ok(())
}
