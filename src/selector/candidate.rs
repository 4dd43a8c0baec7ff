// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use serde::Serialize;

/// A process as seen by one scan.
///
/// Produced by a [`ProcessProvider`](crate::ProcessProvider) snapshot and
/// never mutated by the reclaimer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub id: u32,
    pub display_name: String,
    /// Higher = more expendable
    pub priority_score: i32,
    /// Resident pages
    pub footprint_pages: u64,
    /// Kernel-owned task, never a victim
    pub is_system_task: bool,
    /// Already sent a kill and not yet reaped
    pub death_pending: bool,
}

impl Candidate {
    pub fn new(id: u32, display_name: impl Into<String>, priority_score: i32, footprint_pages: u64) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            priority_score,
            footprint_pages,
            is_system_task: false,
            death_pending: false,
        }
    }

    #[must_use]
    pub fn system(mut self) -> Self {
        self.is_system_task = true;
        self
    }

    #[must_use]
    pub fn dying(mut self) -> Self {
        self.death_pending = true;
        self
    }
}

/// The outcome of a successful scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Victim {
    pub candidate: Candidate,
    /// Score after the exemption discount
    pub score: i32,
    /// Selected through the invoking-actor fallback
    pub fallback: bool,
}

impl Victim {
    #[must_use]
    pub fn id(&self) -> u32 {
        self.candidate.id
    }

    #[must_use]
    pub fn footprint_pages(&self) -> u64 {
        self.candidate.footprint_pages
    }
}
