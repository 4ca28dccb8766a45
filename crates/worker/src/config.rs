// SPDX-License-Identifier: MIT

//! Worker configuration: CLI flags layered over an optional TOML file,
//! probed host facts filling in anything neither specifies.

use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "lightsched-worker", about = "LightSched worker agent")]
pub struct Cli {
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub controller_addr: Option<String>,
    #[arg(long)]
    pub heartbeat_secs: Option<u64>,
    #[arg(long)]
    pub cpu_cores: Option<f64>,
    #[arg(long)]
    pub memory_mib: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub name: String,
    pub controller_addr: String,
    pub heartbeat_secs: u64,
    /// CLI/file override for probed CPU core count; `None` means trust the probe.
    pub cpu_cores: Option<f64>,
    /// CLI/file override for probed memory size in MiB.
    pub memory_mib: Option<i64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: String::new(),
            controller_addr: "http://127.0.0.1:20517".to_string(),
            heartbeat_secs: 5,
            cpu_cores: None,
            memory_mib: None,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
                toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.clone(), source })?
            }
            None => Config::default(),
        };
        if let Some(name) = cli.name.clone() {
            config.name = name;
        }
        if let Some(addr) = cli.controller_addr.clone() {
            config.controller_addr = addr;
        }
        if let Some(secs) = cli.heartbeat_secs {
            config.heartbeat_secs = secs;
        }
        if cli.cpu_cores.is_some() {
            config.cpu_cores = cli.cpu_cores;
        }
        if cli.memory_mib.is_some() {
            config.memory_mib = cli.memory_mib;
        }
        if config.name.is_empty() {
            config.name = hostname();
        }
        Ok(config)
    }
}

fn hostname() -> String {
    sysinfo::System::host_name().unwrap_or_else(|| "lightsched-worker".to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}
