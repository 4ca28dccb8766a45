// SPDX-License-Identifier: MIT

//! Submission and registration payloads: everything a client or worker
//! sends to the controller.

use lightsched_core::ResourceSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub queue: Option<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub taints: BTreeMap<String, String>,
    #[serde(default = "default_true")]
    pub schedulable: bool,
    #[serde(default)]
    pub max_errors: i32,
    pub groups: Vec<TaskGroupSpec>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskGroupSpec {
    pub name: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub workdir: Option<String>,
    #[serde(default)]
    pub envs: Vec<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    pub tasks: Vec<TaskSpec>,
    #[serde(default)]
    pub dependents: Vec<String>,
    #[serde(default)]
    pub resources: Option<ResourceSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    #[serde(default)]
    pub envs: Vec<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Option<String>,
    #[serde(default)]
    pub workdir: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub resources: Option<ResourceSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CpuSpec {
    #[serde(default)]
    pub cores: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub min_frequency: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GpuSpec {
    #[serde(default)]
    pub cards: Option<String>,
    #[serde(default)]
    pub memory: Option<String>,
    #[serde(default)]
    pub cuda: Option<String>,
}

/// Wire form of a `ResourceSet`: every quantity is a string with an
/// optional unit suffix so a submitter can write `"2Gi"` or `"1.5"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceSpec {
    #[serde(default)]
    pub cpu: CpuSpec,
    #[serde(default)]
    pub gpu: GpuSpec,
    #[serde(default)]
    pub memory: Option<String>,
    #[serde(default)]
    pub others: BTreeMap<String, String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantityParseError {
    #[error("\"{0}\" is not a valid quantity")]
    InvalidNumber(String),
    #[error("\"{0}\" is not a valid CUDA version")]
    InvalidCudaVersion(String),
}

/// Parses a quantity string with an optional unit suffix into its base
/// unit. `Gi`/`Mi` are binary (×1024/×1024²... here only one level is
/// needed since the base unit is already MiB); `GHz`/`MHz` are decimal.
/// An unrecognized or absent suffix means the bare number in the base unit.
pub fn parse_quantity(raw: &str, base_unit_suffix: &str, multiplier: f64) -> Result<i64, QuantityParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    let (number, scale) = if let Some(n) = trimmed.strip_suffix(base_unit_suffix) {
        (n, multiplier)
    } else {
        (trimmed, 1.0)
    };
    let value: f64 =
        number.trim().parse().map_err(|_| QuantityParseError::InvalidNumber(raw.to_string()))?;
    Ok((value * scale).round() as i64)
}

/// Parses a memory quantity (`"2Gi"`, `"512Mi"`, bare MiB number) into MiB.
pub fn parse_memory_mib(raw: &str) -> Result<i64, QuantityParseError> {
    let trimmed = raw.trim();
    if let Some(n) = trimmed.strip_suffix("Gi") {
        let value: f64 =
            n.trim().parse().map_err(|_| QuantityParseError::InvalidNumber(raw.to_string()))?;
        return Ok((value * 1024.0).round() as i64);
    }
    if let Some(n) = trimmed.strip_suffix("Mi") {
        let value: f64 =
            n.trim().parse().map_err(|_| QuantityParseError::InvalidNumber(raw.to_string()))?;
        return Ok(value.round() as i64);
    }
    parse_quantity(trimmed, "", 1.0)
}

/// Parses a frequency quantity (`"2.4GHz"`, `"2400MHz"`, bare MHz number) into MHz.
pub fn parse_frequency_mhz(raw: &str) -> Result<i64, QuantityParseError> {
    let trimmed = raw.trim();
    if let Some(n) = trimmed.strip_suffix("GHz") {
        let value: f64 =
            n.trim().parse().map_err(|_| QuantityParseError::InvalidNumber(raw.to_string()))?;
        return Ok((value * 1000.0).round() as i64);
    }
    if let Some(n) = trimmed.strip_suffix("MHz") {
        let value: f64 =
            n.trim().parse().map_err(|_| QuantityParseError::InvalidNumber(raw.to_string()))?;
        return Ok(value.round() as i64);
    }
    parse_quantity(trimmed, "", 1.0)
}

/// Parses a core-count quantity (`"1.5"`, `"4"`) into milli-cores.
pub fn parse_cores_milli(raw: &str) -> Result<i64, QuantityParseError> {
    let trimmed = raw.trim();
    let value: f64 =
        trimmed.parse().map_err(|_| QuantityParseError::InvalidNumber(raw.to_string()))?;
    Ok((value * 1000.0).round() as i64)
}

/// Parses a CUDA version string (`"11.2"`) into `major * 100 + minor`.
pub fn parse_cuda_version(raw: &str) -> Result<i64, QuantityParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    let mut parts = trimmed.splitn(2, '.');
    let major: i64 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| QuantityParseError::InvalidCudaVersion(raw.to_string()))?;
    let minor: i64 = match parts.next() {
        Some(s) => s.parse().map_err(|_| QuantityParseError::InvalidCudaVersion(raw.to_string()))?,
        None => 0,
    };
    Ok(major * 100 + minor)
}

impl ResourceSpec {
    /// Converts the wire form into a domain `ResourceSet`, defaulting any
    /// absent field to zero.
    pub fn to_resource_set(&self) -> Result<ResourceSet, QuantityParseError> {
        let cpu_cores_milli = match &self.cpu.cores {
            Some(s) => parse_cores_milli(s)?,
            None => 0,
        };
        let cpu_frequency = match &self.cpu.frequency {
            Some(s) => parse_frequency_mhz(s)?,
            None => 0,
        };
        let cpu_min_freq = match &self.cpu.min_frequency {
            Some(s) => parse_frequency_mhz(s)?,
            None => 0,
        };
        let gpu_cards = match &self.gpu.cards {
            Some(s) => s.trim().parse().map_err(|_| QuantityParseError::InvalidNumber(s.clone()))?,
            None => 0,
        };
        let gpu_memory = match &self.gpu.memory {
            Some(s) => parse_memory_mib(s)?,
            None => 0,
        };
        let gpu_cuda = match &self.gpu.cuda {
            Some(s) => parse_cuda_version(s)?,
            None => 0,
        };
        let memory = match &self.memory {
            Some(s) => parse_memory_mib(s)?,
            None => 0,
        };
        let mut others = BTreeMap::new();
        for (key, value) in &self.others {
            let parsed: i64 =
                value.trim().parse().map_err(|_| QuantityParseError::InvalidNumber(value.clone()))?;
            others.insert(key.clone(), parsed);
        }
        Ok(ResourceSet {
            cpu_cores_milli,
            cpu_frequency,
            cpu_min_freq,
            gpu_cards,
            gpu_cuda,
            gpu_memory,
            memory,
            others,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterNode {
    pub name: String,
    pub platform: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    pub resources: ResourceSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heartbeat {
    pub name: String,
    pub cpu: f32,
    pub memory: f32,
    pub executings: i32,
    #[serde(default)]
    pub payload: Vec<TaskReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    pub id: String,
    pub state: String,
    pub progress: i32,
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_memory_handles_binary_suffixes() {
        assert_eq!(parse_memory_mib("2Gi").unwrap(), 2048);
        assert_eq!(parse_memory_mib("512Mi").unwrap(), 512);
        assert_eq!(parse_memory_mib("1024").unwrap(), 1024);
    }

    #[test]
    fn parse_frequency_handles_decimal_suffixes() {
        assert_eq!(parse_frequency_mhz("2.4GHz").unwrap(), 2400);
        assert_eq!(parse_frequency_mhz("2400MHz").unwrap(), 2400);
        assert_eq!(parse_frequency_mhz("2400").unwrap(), 2400);
    }

    #[test]
    fn parse_cores_handles_fractional_values() {
        assert_eq!(parse_cores_milli("1.5").unwrap(), 1500);
        assert_eq!(parse_cores_milli("4").unwrap(), 4000);
    }

    #[test]
    fn parse_cuda_version_splits_major_minor() {
        assert_eq!(parse_cuda_version("11.2").unwrap(), 1102);
        assert_eq!(parse_cuda_version("12").unwrap(), 1200);
        assert_eq!(parse_cuda_version("").unwrap(), 0);
    }

    #[test]
    fn resource_spec_converts_to_resource_set() {
        let spec = ResourceSpec {
            cpu: CpuSpec {
                cores: Some("2".into()),
                frequency: Some("4800MHz".into()),
                min_frequency: Some("2.0GHz".into()),
            },
            gpu: GpuSpec {
                cards: Some("1".into()),
                memory: Some("8Gi".into()),
                cuda: Some("11.2".into()),
            },
            memory: Some("4Gi".into()),
            others: BTreeMap::new(),
        };
        let set = spec.to_resource_set().unwrap();
        assert_eq!(set.cpu_cores_milli, 2000);
        assert_eq!(set.cpu_frequency, 4800);
        assert_eq!(set.cpu_min_freq, 2000);
        assert_eq!(set.gpu_cards, 1);
        assert_eq!(set.gpu_memory, 8192);
        assert_eq!(set.gpu_cuda, 1102);
        assert_eq!(set.memory, 4096);
    }

    #[test]
    fn job_spec_round_trips_through_json() {
        let spec = JobSpec {
            id: None,
            name: "demo".into(),
            queue: Some("default".into()),
            priority: 10,
            labels: BTreeMap::new(),
            taints: BTreeMap::new(),
            schedulable: true,
            max_errors: 0,
            groups: vec![TaskGroupSpec {
                name: "g0".into(),
                command: Some("echo".into()),
                workdir: None,
                envs: Vec::new(),
                labels: BTreeMap::new(),
                tasks: vec![TaskSpec {
                    name: "t0".into(),
                    envs: Vec::new(),
                    command: None,
                    args: Some("hi".into()),
                    workdir: None,
                    labels: BTreeMap::new(),
                    resources: None,
                }],
                dependents: Vec::new(),
                resources: None,
            }],
        };
        let json = serde_json::to_string(&spec).unwrap();
        let back: JobSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, spec.name);
        assert_eq!(back.groups[0].tasks[0].args.as_deref(), Some("hi"));
    }
}
