// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Multi-victim batching policy.
//!
//! With batching enabled, one reclaim round may kill several victims before
//! returning. How many depends on the score of the victim just killed:
//!
//! ```text
//!   score >= high_cutoff             → up to high_count kills
//!   low_cutoff <= score < high_cutoff → up to min(low_count, high_count)
//!   score < low_cutoff               → one kill, round ends
//! ```
//!
//! # Example
//!
//! ```
//! use lowmem_reclaim::BatchPolicy;
//!
//! let policy = BatchPolicy { enabled: true, ..Default::default() };
//! assert_eq!(policy.kill_limit(900), 5);
//! assert_eq!(policy.kill_limit(200), 3);
//! assert_eq!(policy.kill_limit(100), 1);
//! assert!(policy.should_continue(1, 900));
//! assert!(!policy.should_continue(5, 900));
//! ```

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BatchPolicy {
    #[serde(default)]
    pub enabled: bool,

    /// Scores at or above this get the larger batch
    #[serde(default = "default_high_cutoff")]
    pub high_cutoff: i32,
    #[serde(default = "default_high_count")]
    pub high_count: u32,

    /// Scores at or above this (but below `high_cutoff`) get the smaller batch
    #[serde(default = "default_low_cutoff")]
    pub low_cutoff: i32,
    #[serde(default = "default_low_count")]
    pub low_count: u32,

    /// Cooldown after each kill while batching (0 lets the batch proceed)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_high_cutoff() -> i32 { 470 }
fn default_high_count() -> u32 { 5 }
fn default_low_cutoff() -> i32 { 176 }
fn default_low_count() -> u32 { 3 }
fn default_interval_ms() -> u64 { 1000 }

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            high_cutoff: default_high_cutoff(),
            high_count: default_high_count(),
            low_cutoff: default_low_cutoff(),
            low_count: default_low_count(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl BatchPolicy {
    /// Maximum kills in one round once a victim with `score` has been killed.
    #[must_use]
    pub fn kill_limit(&self, score: i32) -> u32 {
        if !self.enabled {
            return 1;
        }
        if score >= self.high_cutoff {
            self.high_count.max(1)
        } else if score >= self.low_cutoff {
            self.low_count.min(self.high_count).max(1)
        } else {
            1
        }
    }

    /// Whether the round should look for another victim after `killed` kills,
    /// the latest of which scored `last_score`.
    #[must_use]
    pub fn should_continue(&self, killed: u32, last_score: i32) -> bool {
        killed < self.kill_limit(last_score)
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
