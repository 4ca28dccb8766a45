// SPDX-License-Identifier: MIT

//! `lightsched node` — list, inspect, and admin-toggle cluster nodes.

use crate::client::ApiClient;
use crate::output::{print, OutputFormat, Table};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct NodeArgs {
    #[command(subcommand)]
    pub command: NodeCommand,
}

#[derive(Subcommand)]
pub enum NodeCommand {
    /// List registered nodes
    List,
    /// Show a single node's details
    Show { name: String },
    /// Mark a node schedulable again
    Online { name: String },
    /// Mark a node unschedulable without disconnecting it
    Offline { name: String },
}

pub async fn run(client: &ApiClient, args: NodeArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        NodeCommand::List => {
            let nodes = client.list_nodes().await?;
            print(&nodes, format, |nodes| {
                let mut table = Table::new(vec!["NAME", "STATE", "PLATFORM", "CPU%", "MEM%", "TASKS"]);
                for node in nodes {
                    table.push(vec![
                        node.name.clone(),
                        format!("{:?}", node.state),
                        node.platform.clone(),
                        format!("{:.0}", node.cpu_percent),
                        format!("{:.0}", node.mem_percent),
                        node.executing_count.to_string(),
                    ]);
                }
                table.print();
            });
        }
        NodeCommand::Show { name } => {
            let node = client.get_node(&name).await?;
            print(&node, format, |node| {
                println!("name:      {}", node.name);
                println!("address:   {}", node.address);
                println!("platform:  {}", node.platform);
                println!("state:     {:?}", node.state);
                println!("cpu:       {:.1}%", node.cpu_percent);
                println!("mem:       {:.1}%", node.mem_percent);
                println!("executing: {}", node.executing_count);
            });
        }
        NodeCommand::Online { name } => {
            client.online_node(&name).await?;
            println!("{name} marked online");
        }
        NodeCommand::Offline { name } => {
            client.offline_node(&name).await?;
            println!("{name} marked offline");
        }
    }
    Ok(())
}
