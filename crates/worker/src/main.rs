// SPDX-License-Identifier: MIT

//! `lightsched-worker`: the node agent binary. Probes the host, registers
//! with the controller, then runs the heartbeat/dispatch loop until the
//! process is asked to stop.

use clap::Parser;
use lightsched_worker::probe::{HostFacts, HostProbe, SystemProbe};
use lightsched_worker::{Cli, Config, ControllerClient, WorkerLoop};
use lightsched_wire::{CpuSpec, GpuSpec, RegisterNode, ResourceSpec};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = match Config::load(&cli) {
        Ok(c) => c,
        Err(err) => {
            eprintln!("lightsched-worker: {err}");
            std::process::exit(1);
        }
    };

    init_logging();

    let facts = HostProbe.probe();
    let descriptor = build_descriptor(&config, facts);
    let binary_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| std::path::PathBuf::from("."));

    tracing::info!(name = %descriptor.name, controller = %config.controller_addr, "starting lightsched-worker");

    let client = ControllerClient::new(config.controller_addr.clone(), Duration::from_secs(config.heartbeat_secs * 2));
    let worker_loop = WorkerLoop {
        client,
        descriptor,
        heartbeat_interval: Duration::from_secs(config.heartbeat_secs),
        binary_dir,
    };

    worker_loop.run().await;
}

fn build_descriptor(config: &Config, facts: HostFacts) -> RegisterNode {
    let cpu_cores = config.cpu_cores.unwrap_or(facts.cpu_cores);
    let memory_mib = config.memory_mib.unwrap_or(facts.memory_mib);
    let cuda = if facts.gpu.cuda == 0 {
        None
    } else {
        Some(format!("{}.{}", facts.gpu.cuda / 100, facts.gpu.cuda % 100))
    };

    RegisterNode {
        name: config.name.clone(),
        platform: facts.platform,
        labels: Default::default(),
        resources: ResourceSpec {
            cpu: CpuSpec {
                cores: Some(cpu_cores.to_string()),
                frequency: Some(format!("{}MHz", facts.cpu_frequency_mhz)),
                min_frequency: None,
            },
            gpu: GpuSpec {
                cards: Some(facts.gpu.cards.to_string()),
                memory: Some(format!("{}Mi", facts.gpu.memory_mib)),
                cuda,
            },
            memory: Some(format!("{memory_mib}Mi")),
            others: Default::default(),
        },
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
