// SPDX-License-Identifier: MIT

//! `lightsched`: a thin command-line client for the controller's client API.

use anyhow::Result;
use clap::{Parser, Subcommand};
use lightsched_cli::client::ApiClient;
use lightsched_cli::commands::{cluster, job, node, task};
use lightsched_cli::output::OutputFormat;

#[derive(Parser)]
#[command(name = "lightsched", about = "Command-line client for a LightSched cluster")]
struct Cli {
    /// Controller client-API base URL
    #[arg(long, default_value = "http://127.0.0.1:20516")]
    controller_addr: String,

    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cluster-wide summary
    Cluster,
    /// Job management commands
    Job(job::JobArgs),
    /// Task inspection commands
    Task(task::TaskArgs),
    /// Node management commands
    Node(node::NodeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = ApiClient::new(cli.controller_addr);

    match cli.command {
        Command::Cluster => cluster::info(&client, cli.format).await,
        Command::Job(args) => job::run(&client, args, cli.format).await,
        Command::Task(args) => task::run(&client, args, cli.format).await,
        Command::Node(args) => node::run(&client, args, cli.format).await,
    }
}
