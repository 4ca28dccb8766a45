// SPDX-License-Identifier: MIT

//! `lightsched task` — list, inspect, and fetch the log of a task.

use crate::client::ApiClient;
use crate::output::{print, OutputFormat, Table};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// List tasks, optionally scoped to one job
    List {
        #[arg(long)]
        jobid: Option<String>,
    },
    /// Show a single task's details
    Show { id: String },
    /// Print a task's accumulated stdout/stderr log
    Log { id: String },
}

pub async fn run(client: &ApiClient, args: TaskArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        TaskCommand::List { jobid } => {
            let tasks = client.list_tasks(jobid.as_deref()).await?;
            print(&tasks, format, |tasks| {
                let mut table = Table::new(vec!["ID", "STATE", "PROGRESS", "NODE"]);
                for task in tasks {
                    table.push(vec![
                        task.id.clone(),
                        format!("{:?}", task.state),
                        format!("{}%", task.progress),
                        task.node_name.clone().unwrap_or_else(|| "-".to_string()),
                    ]);
                }
                table.print();
            });
        }
        TaskCommand::Show { id } => {
            let task = client.get_task(&id).await?;
            print(&task, format, |task| {
                println!("id:       {}", task.id);
                println!("name:     {}", task.name);
                println!("command:  {} {}", task.command, task.args);
                println!("state:    {:?}", task.state);
                println!("node:     {}", task.node_name.clone().unwrap_or_else(|| "-".to_string()));
                println!("progress: {}%", task.progress);
                if let Some(code) = task.exit_code {
                    println!("exit:     {code}");
                }
                if !task.error.is_empty() {
                    println!("error:    {}", task.error);
                }
            });
        }
        TaskCommand::Log { id } => {
            let log = client.get_task_log(&id).await?;
            print!("{log}");
        }
    }
    Ok(())
}
