// SPDX-License-Identifier: MIT

//! Controller configuration: CLI flags layered over an optional TOML file.
//! Flags always win over the file; the file always wins over built-in
//! defaults.

use clap::Parser;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "lightschedd", about = "LightSched cluster controller")]
pub struct Cli {
    /// TOML config file; any flag below overrides the value it sets.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    #[arg(long)]
    pub client_addr: Option<SocketAddr>,

    #[arg(long)]
    pub node_addr: Option<SocketAddr>,

    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub client_addr: SocketAddr,
    pub node_addr: SocketAddr,
    pub offline_threshold_secs: i64,
    pub outbox_shard_count: usize,
    pub reserved_cores: f64,
    pub reserved_memory_mib: i64,
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/var/lib/lightsched"),
            client_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 20516),
            node_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 20517),
            offline_threshold_secs: 30,
            outbox_shard_count: crate::nodecache::DEFAULT_SHARD_COUNT,
            // A node always keeps 1.5 cores / 2 GiB back for its own agent
            // and the OS, on top of whatever it advertises as available.
            reserved_cores: 1.5,
            reserved_memory_mib: 2048,
            log_dir: None,
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
        if let Some(dir) = cli.data_dir.clone() {
            config.data_dir = dir;
        }
        if let Some(addr) = cli.client_addr {
            config.client_addr = addr;
        }
        if let Some(addr) = cli.node_addr {
            config.node_addr = addr;
        }
        if let Some(dir) = cli.log_dir.clone() {
            config.log_dir = Some(dir);
        }
        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}
