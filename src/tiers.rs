// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Tier table: (priority cutoff, free-memory floor) pairs.
//!
//! A tier matches when both free pages and reclaimable file pages are below
//! its floor. Floors ascend with the table index and the **last** matching
//! tier wins.
//!
//! # Example
//!
//! ```
//! use lowmem_reclaim::TierTable;
//!
//! let table = TierTable::new(&[0, 1, 6, 12], &[1536, 2048, 4096, 16384]);
//! assert_eq!(table.lookup(100_000, 100_000), None);
//! assert_eq!(table.lookup(10_000, 10_000), Some(12));
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Lowest priority score (never killed voluntarily).
pub const SCORE_ADJ_MIN: i32 = -1000;

/// Highest priority score (most expendable).
pub const SCORE_ADJ_MAX: i32 = 1000;

/// Cutoff value used in logs and metrics when no reclaim is due.
pub const CUTOFF_NONE: i32 = SCORE_ADJ_MAX + 1;

/// Maximum number of tiers the configuration surface accepts.
pub const MAX_TIERS: usize = 6;

/// One tier of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierEntry {
    /// Minimum score a candidate needs to be killable in this tier
    pub priority_cutoff: i32,
    /// Tier applies when free and file pages are both below this
    pub free_floor_pages: u64,
}

impl TierEntry {
    #[must_use]
    pub fn matches(&self, free_pages: u64, file_pages: u64) -> bool {
        free_pages < self.free_floor_pages && file_pages < self.free_floor_pages
    }
}

/// Ordered tier table, ascending by floor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierTable {
    entries: Vec<TierEntry>,
}

impl TierTable {
    /// Build from the parallel cutoff (`adj`) and floor (`minfree`) tables.
    ///
    /// Mismatched lengths are clamped to the shorter table.
    pub fn new(adj: &[i32], minfree: &[u64]) -> Self {
        if adj.len() != minfree.len() {
            warn!(
                adj_len = adj.len(),
                minfree_len = minfree.len(),
                "Tier tables differ in length, clamping to the shorter one"
            );
        }

        let entries = adj
            .iter()
            .zip(minfree.iter())
            .map(|(&priority_cutoff, &free_floor_pages)| TierEntry {
                priority_cutoff,
                free_floor_pages,
            })
            .collect();

        Self { entries }
    }

    pub fn from_entries(entries: Vec<TierEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[TierEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Floor of the last (loosest-memory) tier, if any.
    #[must_use]
    pub fn last_floor(&self) -> Option<u64> {
        self.entries.last().map(|e| e.free_floor_pages)
    }

    /// The most severe matching tier, if any.
    #[must_use]
    pub fn matching_entry(&self, free_pages: u64, file_pages: u64) -> Option<TierEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.matches(free_pages, file_pages))
            .copied()
    }

    /// Cutoff for the current memory state, or `None` when no reclaim is due.
    #[must_use]
    pub fn lookup(&self, free_pages: u64, file_pages: u64) -> Option<i32> {
        self.matching_entry(free_pages, file_pages)
            .map(|e| e.priority_cutoff)
    }
}
