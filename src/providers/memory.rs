// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-memory collaborators for tests and simulations.

use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::Arc;

use super::traits::{MemoryProbe, MemoryStats, ProcessProvider, TerminateError, Terminator};
use crate::selector::Candidate;

/// Process table held in memory.
#[derive(Debug, Default)]
pub struct StaticProvider {
    processes: RwLock<Vec<Candidate>>,
}

impl StaticProvider {
    pub fn new(processes: Vec<Candidate>) -> Self {
        Self {
            processes: RwLock::new(processes),
        }
    }

    pub fn set(&self, processes: Vec<Candidate>) {
        *self.processes.write() = processes;
    }

    pub fn push(&self, process: Candidate) {
        self.processes.write().push(process);
    }

    /// Simulate the process exiting and its memory being reaped.
    pub fn reap(&self, id: u32) -> bool {
        let mut processes = self.processes.write();
        let before = processes.len();
        processes.retain(|c| c.id != id);
        processes.len() != before
    }

    pub fn mark_dying(&self, id: u32) {
        if let Some(c) = self.processes.write().iter_mut().find(|c| c.id == id) {
            c.death_pending = true;
        }
    }

    pub fn len(&self) -> usize {
        self.processes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.read().is_empty()
    }
}

impl ProcessProvider for StaticProvider {
    fn enumerate(&self) -> Vec<Candidate> {
        self.processes.read().clone()
    }
}

/// Memory counters set by hand.
#[derive(Debug, Default)]
pub struct FixedProbe {
    stats: RwLock<MemoryStats>,
}

impl FixedProbe {
    pub fn new(stats: MemoryStats) -> Self {
        Self {
            stats: RwLock::new(stats),
        }
    }

    pub fn set(&self, stats: MemoryStats) {
        *self.stats.write() = stats;
    }
}

impl MemoryProbe for FixedProbe {
    fn sample(&self) -> MemoryStats {
        *self.stats.read()
    }
}

/// Records kills instead of sending signals.
///
/// When linked to a [`StaticProvider`], a kill flags the process as dying
/// there, the way the OS would.
#[derive(Debug, Default)]
pub struct RecordingTerminator {
    calls: Mutex<Vec<u32>>,
    killed: Mutex<HashSet<u32>>,
    failing: Mutex<HashSet<u32>>,
    provider: Option<Arc<StaticProvider>>,
}

impl RecordingTerminator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn linked(provider: Arc<StaticProvider>) -> Self {
        Self {
            provider: Some(provider),
            ..Default::default()
        }
    }

    /// Make terminating `id` fail with [`TerminateError::Denied`].
    pub fn fail_for(&self, id: u32) {
        self.failing.lock().insert(id);
    }

    /// Every terminate call in order, including repeats and failures.
    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().clone()
    }

    /// Distinct ids successfully killed.
    pub fn killed(&self) -> HashSet<u32> {
        self.killed.lock().clone()
    }
}

impl Terminator for RecordingTerminator {
    fn terminate(&self, victim: &Candidate) -> Result<(), TerminateError> {
        self.calls.lock().push(victim.id);
        if self.failing.lock().contains(&victim.id) {
            return Err(TerminateError::Denied(victim.id));
        }

        let first = self.killed.lock().insert(victim.id);
        if first {
            if let Some(provider) = &self.provider {
                provider.mark_dying(victim.id);
            }
        }
        Ok(())
    }
}
