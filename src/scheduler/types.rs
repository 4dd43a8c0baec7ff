//! Public types for the reclaim scheduler.

use crate::scheduler::exclusion::Interrupt;
use crate::selector::{Candidate, Victim};
use crate::threshold::Adjustment;

/// Where the scheduler is in a round.
///
/// ```text
///   Idle ──acquire──► Scanning ──no victim──────────► Idle
///                        │
///                        └──victim──► VictimSelected ──► Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// No round holds the exclusion
    Idle,
    /// Sampling memory, computing the cutoff, selecting
    Scanning,
    /// Terminating and recording a victim
    VictimSelected,
}

impl ScanPhase {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Scanning => 1,
            Self::VictimSelected => 2,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Scanning,
            2 => Self::VictimSelected,
            _ => Self::Idle,
        }
    }
}

impl std::fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Scanning => write!(f, "Scanning"),
            Self::VictimSelected => write!(f, "VictimSelected"),
        }
    }
}

/// One reclaim request from the OS.
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    /// Pages the OS would like back; 0 asks only for the estimate
    pub nr_to_scan: u64,
    /// The process whose allocation triggered this round
    pub invoker: Option<Candidate>,
    /// Lets a caller stuck waiting on the exclusion give up
    pub interrupt: Option<Interrupt>,
}

impl ScanRequest {
    pub fn new(nr_to_scan: u64) -> Self {
        Self {
            nr_to_scan,
            ..Default::default()
        }
    }

    /// Estimate-only request.
    pub fn count_only() -> Self {
        Self::new(0)
    }

    #[must_use]
    pub fn with_invoker(mut self, invoker: Candidate) -> Self {
        self.invoker = Some(invoker);
        self
    }

    #[must_use]
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }
}

/// One terminate attempt within a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillAttempt {
    pub victim: Victim,
    /// Whether the terminator accepted the kill
    pub terminated: bool,
}

/// How a reclaim round ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReclaimOutcome {
    /// Interrupted while waiting for the exclusion; nothing was touched
    Interrupted,
    /// `nr_to_scan` was 0
    CountOnly { estimate: u64 },
    /// No tier matched and no escalation was pending
    NoReclaimDue { estimate: u64 },
    /// A previous victim is still dying inside the cooldown interval
    CoolingDown,
    /// A cutoff applied but no process qualified
    NoVictim { cutoff: i32, estimate: u64 },
    /// At least one victim was selected and sent a kill
    Killed {
        cutoff: i32,
        adjustment: Adjustment,
        kills: Vec<KillAttempt>,
        estimate: u64,
    },
}

impl ReclaimOutcome {
    /// Remaining reclaimable pages reported back to the OS.
    #[must_use]
    pub fn pages(&self) -> u64 {
        match self {
            Self::Interrupted | Self::CoolingDown => 0,
            Self::CountOnly { estimate }
            | Self::NoReclaimDue { estimate }
            | Self::NoVictim { estimate, .. }
            | Self::Killed { estimate, .. } => *estimate,
        }
    }

    /// Metric label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Interrupted => "interrupted",
            Self::CountOnly { .. } => "count_only",
            Self::NoReclaimDue { .. } => "no_reclaim_due",
            Self::CoolingDown => "cooling_down",
            Self::NoVictim { .. } => "no_victim",
            Self::Killed { .. } => "killed",
        }
    }

    /// Ids sent a kill this round, successful or not.
    #[must_use]
    pub fn victim_ids(&self) -> Vec<u32> {
        match self {
            Self::Killed { kills, .. } => kills.iter().map(|k| k.victim.id()).collect(),
            _ => Vec::new(),
        }
    }
}

impl std::fmt::Display for ReclaimOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Killed { cutoff, kills, estimate, .. } => write!(
                f,
                "killed {} (cutoff {}, {} pages left)",
                kills.len(),
                cutoff,
                estimate
            ),
            Self::NoVictim { cutoff, estimate } => {
                write!(f, "no victim (cutoff {}, {} pages left)", cutoff, estimate)
            }
            other => write!(f, "{} ({} pages)", other.label(), other.pages()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_round_trips_through_u8() {
        for phase in [ScanPhase::Idle, ScanPhase::Scanning, ScanPhase::VictimSelected] {
            assert_eq!(ScanPhase::from_u8(phase.as_u8()), phase);
        }
        assert_eq!(ScanPhase::from_u8(200), ScanPhase::Idle);
    }

    #[test]
    fn test_outcome_pages() {
        assert_eq!(ReclaimOutcome::Interrupted.pages(), 0);
        assert_eq!(ReclaimOutcome::CoolingDown.pages(), 0);
        assert_eq!(ReclaimOutcome::CountOnly { estimate: 42 }.pages(), 42);
        assert_eq!(ReclaimOutcome::NoVictim { cutoff: 0, estimate: 7 }.pages(), 7);
    }

    #[test]
    fn test_outcome_display() {
        let outcome = ReclaimOutcome::NoReclaimDue { estimate: 10 };
        assert_eq!(outcome.to_string(), "no_reclaim_due (10 pages)");
        assert_eq!(outcome.label(), "no_reclaim_due");
        assert!(outcome.victim_ids().is_empty());
    }

    #[test]
    fn test_request_builders() {
        let request = ScanRequest::new(128)
            .with_invoker(Candidate::new(5, "app", 0, 10))
            .with_interrupt(Interrupt::new());
        assert_eq!(request.nr_to_scan, 128);
        assert_eq!(request.invoker.as_ref().map(|c| c.id), Some(5));
        assert!(request.interrupt.is_some());
        assert_eq!(ScanRequest::count_only().nr_to_scan, 0);
    }
}
