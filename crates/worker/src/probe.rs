// SPDX-License-Identifier: MIT

//! Host introspection: CPU, memory, and GPU facts gathered at startup.
//! Abstracted behind a trait so tests can supply fixed values instead of
//! depending on the machine running them.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpuFacts {
    pub cards: i64,
    pub memory_mib: i64,
    /// Encoded as `major*100 + minor`, 0 if unknown/absent.
    pub cuda: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostFacts {
    pub platform: String,
    pub cpu_cores: f64,
    pub cpu_frequency_mhz: i64,
    pub memory_mib: i64,
    pub gpu: GpuFacts,
}

pub trait SystemProbe: Send + Sync {
    fn probe(&self) -> HostFacts;
}

/// Probes the real host: `sysinfo` for CPU/memory, `nvidia-smi` for GPU
/// facts. Any GPU probe failure (binary missing, non-zero exit, malformed
/// output) is treated as "no GPU" rather than a startup error.
pub struct HostProbe;

impl SystemProbe for HostProbe {
    fn probe(&self) -> HostFacts {
        let mut sys = sysinfo::System::new_all();
        sys.refresh_all();

        let cpu_cores = sys.cpus().len().max(1) as f64;
        let cpu_frequency_mhz =
            sys.cpus().first().map(|c| c.frequency() as i64 * cpu_cores as i64).unwrap_or(0);
        let memory_mib = (sys.total_memory() / (1024 * 1024)) as i64;
        let platform = format!(
            "{} {}",
            sysinfo::System::name().unwrap_or_else(|| "unknown".to_string()),
            sysinfo::System::os_version().unwrap_or_default()
        );

        HostFacts { platform, cpu_cores, cpu_frequency_mhz, memory_mib, gpu: probe_gpu() }
    }
}

/// Instantaneous CPU and memory utilization as percentages, sampled fresh
/// on every call. Used for the heartbeat's load-monitoring fields, which
/// are informational only and never consulted by the scheduler's fit
/// calculation.
pub fn current_load() -> (f32, f32) {
    let mut sys = sysinfo::System::new_all();
    sys.refresh_cpu_usage();
    sys.refresh_memory();
    let cpu = sys.global_cpu_usage();
    let mem = if sys.total_memory() == 0 {
        0.0
    } else {
        (sys.used_memory() as f64 / sys.total_memory() as f64 * 100.0) as f32
    };
    (cpu, mem)
}

fn probe_gpu() -> GpuFacts {
    let output = match std::process::Command::new("nvidia-smi")
        .args(["--query-gpu=count,memory.total", "--format=csv,noheader,nounits"])
        .output()
    {
        Ok(output) if output.status.success() => output,
        _ => return GpuFacts::default(),
    };
    let text = String::from_utf8_lossy(&output.stdout);
    let Some(first_line) = text.lines().next() else { return GpuFacts::default() };
    let mut fields = first_line.split(',').map(str::trim);
    let cards = text.lines().count() as i64;
    let memory_mib = fields.nth(1).and_then(|v| v.parse::<i64>().ok()).unwrap_or(0);
    GpuFacts { cards, memory_mib, cuda: probe_cuda_version() }
}

fn probe_cuda_version() -> i64 {
    let output = match std::process::Command::new("nvidia-smi").output() {
        Ok(output) if output.status.success() => output,
        _ => return 0,
    };
    let text = String::from_utf8_lossy(&output.stdout);
    let Some(idx) = text.find("CUDA Version:") else { return 0 };
    let rest = &text[idx + "CUDA Version:".len()..];
    let version = rest.split_whitespace().next().unwrap_or("");
    let mut parts = version.splitn(2, '.');
    let major: i64 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let minor: i64 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    major * 100 + minor
}

#[cfg(test)]
pub struct FixedProbe(pub HostFacts);

#[cfg(test)]
impl SystemProbe for FixedProbe {
    fn probe(&self) -> HostFacts {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_probe_returns_its_configured_facts() {
        let facts = HostFacts {
            platform: "linux test".into(),
            cpu_cores: 4.0,
            cpu_frequency_mhz: 9600,
            memory_mib: 8192,
            gpu: GpuFacts::default(),
        };
        let probe = FixedProbe(facts.clone());
        assert_eq!(probe.probe(), facts);
    }
}
