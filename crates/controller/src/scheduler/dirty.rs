// SPDX-License-Identifier: MIT

//! The scheduler's dirty flag: an atomic counter that collapses any number
//! of concurrent "something changed" signals into "run at least one more
//! cycle". `set` increments; the cycle atomically swaps it to zero, so a
//! `set` racing with the swap either lands before (folded into the cycle
//! that's about to run) or after (guaranteeing one more cycle).

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct DirtyFlag(AtomicU64);

impl DirtyFlag {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    /// Swaps the counter to zero, returning whether it was non-zero.
    pub fn take(&self) -> bool {
        self.0.swap(0, Ordering::SeqCst) > 0
    }
}

/// Running count of scheduling cycles the controller has executed, exposed
/// on `/cluster` so clients can tell the scheduler is alive and making
/// progress. Ticks once per `run_scheduler_cycle` call, whether or not that
/// cycle placed anything.
#[derive(Default)]
pub struct CycleCounter(AtomicU64);

impl CycleCounter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}
