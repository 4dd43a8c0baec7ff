// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Anti-thrash gate between kills.
//!
//! After a kill the victim's memory is not free yet. Until the cooldown
//! deadline passes, a scan that still sees a dying process abstains instead
//! of picking a second victim off stale numbers.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use lowmem_reclaim::{Candidate, CooldownGate};
//!
//! let gate = CooldownGate::new();
//! let t0 = Instant::now();
//! let snapshot = vec![Candidate::new(7, "browser", 900, 4096)];
//!
//! gate.record_kill(7, t0, Duration::from_secs(1));
//! assert!(!gate.try_enter(t0 + Duration::from_millis(500), &snapshot));
//! assert!(gate.try_enter(t0 + Duration::from_millis(1100), &snapshot));
//! ```

use parking_lot::Mutex;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::trace;

use crate::selector::Candidate;

/// Cooldown deadline plus the ids this reclaimer has sent kills to.
#[derive(Debug, Default)]
pub struct CooldownGate {
    deadline: Mutex<Option<Instant>>,
    pending: Mutex<HashSet<u32>>,
}

impl CooldownGate {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        *self.deadline.lock()
    }

    /// Ids killed by us that were still present in the last snapshot.
    #[must_use]
    pub fn pending_ids(&self) -> HashSet<u32> {
        self.pending.lock().clone()
    }

    #[must_use]
    pub fn is_pending(&self, candidate: &Candidate) -> bool {
        candidate.death_pending || self.pending.lock().contains(&candidate.id)
    }

    /// Whether a new victim may be selected at `now`.
    ///
    /// Returns `false` while `now` is before the deadline and some process in
    /// `snapshot` is still dying. Ids that disappeared from the snapshot
    /// are forgotten.
    pub fn try_enter(&self, now: Instant, snapshot: &[Candidate]) -> bool {
        {
            let mut pending = self.pending.lock();
            if !pending.is_empty() {
                let present: HashSet<u32> = snapshot.iter().map(|c| c.id).collect();
                pending.retain(|id| present.contains(id));
            }
        }

        let Some(deadline) = self.deadline() else {
            return true;
        };
        if now >= deadline {
            return true;
        }

        match snapshot.iter().find(|c| self.is_pending(c)) {
            Some(dying) => {
                trace!(
                    name = %dying.display_name,
                    id = dying.id,
                    remaining_ms = (deadline - now).as_millis() as u64,
                    "Previous victim still dying, abstaining"
                );
                false
            }
            None => true,
        }
    }

    /// Mark `victim_id` as dying and push the deadline to `now + interval`.
    pub fn record_kill(&self, victim_id: u32, now: Instant, interval: Duration) {
        self.pending.lock().insert(victim_id);
        *self.deadline.lock() = Some(now + interval);
    }
}
