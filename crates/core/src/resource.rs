// SPDX-License-Identifier: MIT

//! Resource accounting.
//!
//! CPU cores are tracked internally as milli-cores (`cores * 1000`, an
//! integer) so that repeated `consume`/`give_back` pairs restore the exact
//! original value instead of drifting through floating-point rounding.
//! Every other axis is already integral in its natural unit (MHz, MiB,
//! card count).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The axes checked, in order, by the scheduler's fit predicate.
/// The controller uses this to report which axis failed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceAxis {
    GpuCards,
    GpuCuda,
    GpuMemory,
    CpuMinFreq,
    CpuCores,
    CpuFrequency,
    Memory,
}

impl ResourceAxis {
    pub fn name(self) -> &'static str {
        match self {
            ResourceAxis::GpuCards => "gpu.cards",
            ResourceAxis::GpuCuda => "gpu.cuda",
            ResourceAxis::GpuMemory => "gpu.memory",
            ResourceAxis::CpuMinFreq => "cpu.min_frequency",
            ResourceAxis::CpuCores => "cpu.cores",
            ResourceAxis::CpuFrequency => "cpu.frequency",
            ResourceAxis::Memory => "memory",
        }
    }
}

/// A set of CPU/GPU/memory/other resources — used both as a requirement
/// (on a `Task`) and as a quantity (total/reserved/available on a
/// `WorkNode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSet {
    /// CPU cores, fixed at 3 decimal places, stored as cores * 1000.
    pub cpu_cores_milli: i64,
    /// Sum of per-core frequency across `cpu_cores`, in MHz.
    pub cpu_frequency: i64,
    /// Minimum acceptable per-core frequency, in MHz (requirement only).
    pub cpu_min_freq: i64,
    pub gpu_cards: i64,
    /// Minimum CUDA version required/offered, encoded as `major*100 + minor`.
    pub gpu_cuda: i64,
    /// GPU memory in MiB.
    pub gpu_memory: i64,
    /// System memory in MiB.
    pub memory: i64,
    /// Opaque extra resource axes (e.g. licenses, FPGA slots).
    pub others: BTreeMap<String, i64>,
}

impl ResourceSet {
    pub const fn zero() -> Self {
        Self {
            cpu_cores_milli: 0,
            cpu_frequency: 0,
            cpu_min_freq: 0,
            gpu_cards: 0,
            gpu_cuda: 0,
            gpu_memory: 0,
            memory: 0,
            others: BTreeMap::new(),
        }
    }

    /// Default resources assigned to a task that specifies none: 0.8 cores,
    /// 2048 MHz aggregate frequency, 1024 MiB memory, no GPU.
    pub fn default_task_requirement() -> Self {
        Self {
            cpu_cores_milli: 800,
            cpu_frequency: 2048,
            cpu_min_freq: 0,
            gpu_cards: 0,
            gpu_cuda: 0,
            gpu_memory: 0,
            memory: 1024,
            others: BTreeMap::new(),
        }
    }

    pub fn cpu_cores(&self) -> f64 {
        self.cpu_cores_milli as f64 / 1000.0
    }

    pub fn with_cpu_cores(mut self, cores: f64) -> Self {
        self.cpu_cores_milli = (cores * 1000.0).round() as i64;
        self
    }

    pub fn uses_gpu(&self) -> bool {
        self.gpu_cards > 0
    }

    /// True when the requirement pins down a specific core count rather
    /// than being satisfied by any node with enough aggregate frequency.
    /// The scheduler scores on cores when the task specifies a (non-zero)
    /// core requirement, falling back to aggregate frequency otherwise.
    pub fn uses_cores(&self) -> bool {
        self.cpu_cores_milli > 0
    }

    /// Returns `Ok(())` if `self` (available pool) has at least `req` on
    /// every axis that `req` requires, `Err(axis)` for the first axis that
    /// doesn't.
    pub fn fits(&self, req: &ResourceSet) -> Result<(), ResourceAxis> {
        if self.gpu_cards < req.gpu_cards {
            return Err(ResourceAxis::GpuCards);
        }
        if req.gpu_cards > 0 && req.gpu_cuda > 0 && self.gpu_cuda < req.gpu_cuda {
            return Err(ResourceAxis::GpuCuda);
        }
        if req.gpu_cards > 0 && self.gpu_memory < req.gpu_memory {
            return Err(ResourceAxis::GpuMemory);
        }
        if req.cpu_min_freq > 0 && self.cpu_min_freq < req.cpu_min_freq {
            return Err(ResourceAxis::CpuMinFreq);
        }
        if self.cpu_cores_milli < req.cpu_cores_milli {
            return Err(ResourceAxis::CpuCores);
        }
        if self.cpu_frequency < req.cpu_frequency {
            return Err(ResourceAxis::CpuFrequency);
        }
        if self.memory < req.memory {
            return Err(ResourceAxis::Memory);
        }
        for (key, amount) in &req.others {
            let avail = self.others.get(key).copied().unwrap_or(0);
            if avail < *amount {
                return Err(ResourceAxis::Memory); // generic axis, see fits_detailed
            }
        }
        Ok(())
    }

    /// Like `fits`, but names the exact "others" key that failed instead of
    /// collapsing it onto `Memory`. Kept separate from `fits` so the common
    /// case (no "others" requirement) stays branch-free.
    pub fn fits_detailed(&self, req: &ResourceSet) -> Result<(), String> {
        match self.fits(req) {
            Ok(()) => {
                for (key, amount) in &req.others {
                    let avail = self.others.get(key).copied().unwrap_or(0);
                    if avail < *amount {
                        return Err(format!("others.{key}"));
                    }
                }
                Ok(())
            }
            Err(axis) => Err(axis.name().to_string()),
        }
    }

    /// Decrements `self` (a node's available pool) by `req`, failing without
    /// mutating if any axis would go negative.
    pub fn consume(&mut self, req: &ResourceSet) -> Result<(), ResourceAxis> {
        self.fits(req)?;
        for (key, amount) in &req.others {
            if self.others.get(key).copied().unwrap_or(0) < *amount {
                return Err(ResourceAxis::Memory);
            }
        }
        self.cpu_cores_milli -= req.cpu_cores_milli;
        self.cpu_frequency -= req.cpu_frequency;
        self.gpu_cards -= req.gpu_cards;
        self.gpu_memory -= req.gpu_memory;
        self.memory -= req.memory;
        for (key, amount) in &req.others {
            *self.others.entry(key.clone()).or_insert(0) -= amount;
        }
        Ok(())
    }

    /// Increments `self` by `req`. The inverse of `consume`; applying
    /// `consume` then `give_back` with the same `req` is a no-op.
    pub fn give_back(&mut self, req: &ResourceSet) {
        self.cpu_cores_milli += req.cpu_cores_milli;
        self.cpu_frequency += req.cpu_frequency;
        self.gpu_cards += req.gpu_cards;
        self.gpu_memory += req.gpu_memory;
        self.memory += req.memory;
        for (key, amount) in &req.others {
            *self.others.entry(key.clone()).or_insert(0) += amount;
        }
    }
}

impl Default for ResourceSet {
    fn default() -> Self {
        Self::zero()
    }
}
