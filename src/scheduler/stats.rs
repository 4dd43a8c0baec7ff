// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lifetime counters for one scheduler.
///
/// Mirrors a subset of the exported metrics so tests and status endpoints
/// can read them without a recorder installed.
#[derive(Debug, Default)]
pub struct ReclaimStats {
    rounds: AtomicU64,
    kills: AtomicU64,
    killed_pages: AtomicU64,
    termination_failures: AtomicU64,
    escalations_applied: AtomicU64,
    interrupted: AtomicU64,
    cooling_down: AtomicU64,
}

/// Point-in-time copy of [`ReclaimStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReclaimStatsSnapshot {
    pub rounds: u64,
    pub kills: u64,
    pub killed_pages: u64,
    pub termination_failures: u64,
    pub escalations_applied: u64,
    pub interrupted: u64,
    pub cooling_down: u64,
}

impl ReclaimStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_round(&self) {
        self.rounds.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_kill(&self, pages: u64) {
        self.kills.fetch_add(1, Ordering::Relaxed);
        self.killed_pages.fetch_add(pages, Ordering::Relaxed);
    }

    pub(crate) fn record_termination_failure(&self) {
        self.termination_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_escalation(&self) {
        self.escalations_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_interrupted(&self) {
        self.interrupted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cooling_down(&self) {
        self.cooling_down.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> ReclaimStatsSnapshot {
        ReclaimStatsSnapshot {
            rounds: self.rounds.load(Ordering::Relaxed),
            kills: self.kills.load(Ordering::Relaxed),
            killed_pages: self.killed_pages.load(Ordering::Relaxed),
            termination_failures: self.termination_failures.load(Ordering::Relaxed),
            escalations_applied: self.escalations_applied.load(Ordering::Relaxed),
            interrupted: self.interrupted.load(Ordering::Relaxed),
            cooling_down: self.cooling_down.load(Ordering::Relaxed),
        }
    }
}
