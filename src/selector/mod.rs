// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Victim selection.
//!
//! Given a cutoff and a process snapshot, pick the process to kill:
//!
//! 1. skip kernel-owned tasks and tasks with no resident memory
//! 2. apply the [`ExemptionList`] discount
//! 3. drop everything scoring below the cutoff
//! 4. keep the highest score, breaking ties by larger footprint
//! 5. if nothing survives and the cutoff is at or below zero, fall back to
//!    the invoking process (when it is a user process)
//!
//! # Example
//!
//! ```
//! use lowmem_reclaim::{Candidate, ExemptionList, VictimSelector};
//!
//! let selector = VictimSelector::new(ExemptionList::none());
//! let candidates = vec![
//!     Candidate::new(10, "camera", 100, 500),
//!     Candidate::new(11, "browser", 100, 800),
//! ];
//!
//! let victim = selector.scan(50, &candidates).unwrap();
//! assert_eq!(victim.id(), 11);
//! ```

mod candidate;
mod exemption;

pub use candidate::{Candidate, Victim};
pub use exemption::ExemptionList;

use std::collections::HashSet;
use tracing::debug;

/// Picks victims under a cutoff.
#[derive(Debug, Clone, Default)]
pub struct VictimSelector {
    exemptions: ExemptionList,
}

impl VictimSelector {
    pub fn new(exemptions: ExemptionList) -> Self {
        Self { exemptions }
    }

    #[must_use]
    pub fn exemptions(&self) -> &ExemptionList {
        &self.exemptions
    }

    /// Best victim at or above `cutoff`, or `None` if nothing qualifies.
    #[must_use]
    pub fn scan(&self, cutoff: i32, candidates: &[Candidate]) -> Option<Victim> {
        self.scan_excluding(cutoff, candidates, &HashSet::new(), None)
    }

    /// Like [`scan`](Self::scan), skipping `excluded` ids and falling back to
    /// `invoker` when nothing else qualifies.
    #[must_use]
    pub fn scan_excluding(
        &self,
        cutoff: i32,
        candidates: &[Candidate],
        excluded: &HashSet<u32>,
        invoker: Option<&Candidate>,
    ) -> Option<Victim> {
        let mut selected: Option<(&Candidate, i32)> = None;

        for candidate in candidates {
            if candidate.is_system_task || candidate.footprint_pages == 0 {
                continue;
            }
            if excluded.contains(&candidate.id) {
                continue;
            }

            let score = self.exemptions.adjusted_score(candidate);
            if score < cutoff {
                continue;
            }

            if let Some((current, current_score)) = selected {
                if score < current_score {
                    continue;
                }
                if score == current_score && candidate.footprint_pages <= current.footprint_pages {
                    continue;
                }
            }

            debug!(
                name = %candidate.display_name,
                id = candidate.id,
                score,
                size = candidate.footprint_pages,
                "Selected candidate"
            );
            selected = Some((candidate, score));
        }

        if let Some((candidate, score)) = selected {
            return Some(Victim {
                candidate: candidate.clone(),
                score,
                fallback: false,
            });
        }

        self.fallback(cutoff, excluded, invoker)
    }

    fn fallback(&self, cutoff: i32, excluded: &HashSet<u32>, invoker: Option<&Candidate>) -> Option<Victim> {
        let invoker = invoker?;
        if invoker.is_system_task || cutoff > 0 || excluded.contains(&invoker.id) {
            return None;
        }

        debug!(
            name = %invoker.display_name,
            id = invoker.id,
            cutoff,
            "No candidate qualified, falling back to the invoking process"
        );
        Some(Victim {
            candidate: invoker.clone(),
            score: invoker.priority_score,
            fallback: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector() -> VictimSelector {
        VictimSelector::new(ExemptionList::new(["vold"], 100, 100))
    }

    #[test]
    fn test_highest_score_wins() {
        let candidates = vec![
            Candidate::new(1, "a", 200, 100),
            Candidate::new(2, "b", 900, 10),
            Candidate::new(3, "c", 500, 1000),
        ];
        assert_eq!(selector().scan(0, &candidates).unwrap().id(), 2);
    }

    #[test]
    fn test_tie_breaks_by_footprint() {
        let candidates = vec![
            Candidate::new(1, "a", 100, 500),
            Candidate::new(2, "b", 100, 800),
        ];
        let victim = selector().scan(50, &candidates).unwrap();
        assert_eq!(victim.id(), 2);
        assert_eq!(victim.footprint_pages(), 800);
    }

    #[test]
    fn test_equal_ties_keep_first_seen() {
        let candidates = vec![
            Candidate::new(1, "a", 100, 800),
            Candidate::new(2, "b", 100, 800),
        ];
        assert_eq!(selector().scan(50, &candidates).unwrap().id(), 1);
    }

    #[test]
    fn test_skips_system_and_empty_tasks() {
        let candidates = vec![
            Candidate::new(1, "kswapd0", 1000, 5000).system(),
            Candidate::new(2, "zombie", 1000, 0),
            Candidate::new(3, "app", 10, 10),
        ];
        assert_eq!(selector().scan(0, &candidates).unwrap().id(), 3);
        assert!(selector().scan(11, &candidates).is_none());
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let candidates = vec![Candidate::new(1, "a", 6, 10)];
        assert!(selector().scan(6, &candidates).is_some());
        assert!(selector().scan(7, &candidates).is_none());
    }

    #[test]
    fn test_exemption_discount_changes_winner() {
        let candidates = vec![
            Candidate::new(1, "vold", 900, 5000),
            Candidate::new(2, "app", 850, 10),
        ];
        let victim = selector().scan(0, &candidates).unwrap();
        assert_eq!(victim.id(), 2);

        // alone, the exempt process is still killable at its discounted score
        let victim = selector().scan(0, &candidates[..1]).unwrap();
        assert_eq!(victim.id(), 1);
        assert_eq!(victim.score, 800);
        assert!(selector().scan(801, &candidates[..1]).is_none());
    }

    #[test]
    fn test_excluded_ids_are_skipped() {
        let candidates = vec![
            Candidate::new(1, "a", 900, 10),
            Candidate::new(2, "b", 800, 10),
        ];
        let excluded: HashSet<u32> = [1].into_iter().collect();
        let victim = selector().scan_excluding(0, &candidates, &excluded, None).unwrap();
        assert_eq!(victim.id(), 2);
    }

    #[test]
    fn test_invoker_fallback_only_at_non_positive_cutoff() {
        let invoker = Candidate::new(42, "game", 0, 3000);
        let candidates = vec![Candidate::new(1, "a", -100, 10)];
        let none = HashSet::new();

        let victim = selector().scan_excluding(0, &candidates, &none, Some(&invoker)).unwrap();
        assert_eq!(victim.id(), 42);
        assert!(victim.fallback);

        assert!(selector().scan_excluding(1, &candidates, &none, Some(&invoker)).is_none());
    }

    #[test]
    fn test_invoker_fallback_never_picks_system_task() {
        let invoker = Candidate::new(2, "kworker", 0, 0).system();
        assert!(selector().scan_excluding(0, &[], &HashSet::new(), Some(&invoker)).is_none());
    }

    #[test]
    fn test_survivor_beats_invoker_fallback() {
        let invoker = Candidate::new(42, "game", 0, 3000);
        let candidates = vec![Candidate::new(1, "a", 0, 10)];
        let victim = selector()
            .scan_excluding(0, &candidates, &HashSet::new(), Some(&invoker))
            .unwrap();
        assert_eq!(victim.id(), 1);
        assert!(!victim.fallback);
    }
}
