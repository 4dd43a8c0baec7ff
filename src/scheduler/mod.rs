// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Reclaim scheduler.
//!
//! Entry point for the OS reclaim callback. One call is one round:
//!
//! ```text
//!   nr_to_scan == 0 ─────────────────────────────► CountOnly
//!
//!   acquire exclusion ──interrupted──────────────► Interrupted
//!        │
//!   sample memory, tier lookup
//!        │
//!   compute cutoff (consumes escalation)
//!        │ None ─────────────────────────────────► NoReclaimDue
//!        ▼
//!   ┌─► enumerate, cooldown gate ──closed────────► CoolingDown
//!   │        │
//!   │   select victim ──none─────────────────────► NoVictim
//!   │        │
//!   │   terminate, mark pending, report
//!   │        │
//!   └── batch allows another? ──no───────────────► Killed
//! ```
//!
//! The exclusion is held for the whole round and released on every exit
//! path by its guard.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use lowmem_reclaim::{
//!     Candidate, Collaborators, FixedProbe, MemoryStats, ReclaimConfig,
//!     ReclaimScheduler, RecordingReporter, RecordingTerminator,
//!     ScanRequest, StaticProvider,
//! };
//!
//! let provider = Arc::new(StaticProvider::new(vec![
//!     Candidate::new(100, "cached_app", 900, 4096),
//!     Candidate::new(101, "launcher", 0, 8192),
//! ]));
//! let collaborators = Collaborators {
//!     provider: provider.clone(),
//!     probe: Arc::new(FixedProbe::new(MemoryStats::new(1000, 1000))),
//!     terminator: Arc::new(RecordingTerminator::linked(provider)),
//!     reporter: Arc::new(RecordingReporter::new()),
//! };
//!
//! let scheduler = ReclaimScheduler::new(ReclaimConfig::default(), collaborators);
//! let outcome = scheduler.reclaim(&ScanRequest::new(128));
//! assert_eq!(outcome.victim_ids(), vec![100]);
//! ```

mod exclusion;
mod state;
mod stats;
mod types;

pub use exclusion::{Interrupt, ScanExclusion, ScanGuard};
pub use state::ReclaimState;
pub use stats::{ReclaimStats, ReclaimStatsSnapshot};
pub use types::{KillAttempt, ReclaimOutcome, ScanPhase, ScanRequest};

use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, ReclaimConfig};
use crate::metrics;
use crate::pressure::{PressureSignal, PressureState};
use crate::providers::{MemoryProbe, MemoryStats, ProcessProvider, Terminator};
use crate::reporter::{Anomaly, KillRecord, Reporter};
use crate::selector::{Victim, VictimSelector};
use crate::threshold::AdaptiveThreshold;
use crate::tiers::CUTOFF_NONE;

/// Victims scoring below this are foreground-class and worth reporting.
const FOREGROUND_SCORE_LIMIT: i32 = 100;

/// The OS-facing seams a scheduler drives.
#[derive(Clone)]
pub struct Collaborators {
    pub provider: Arc<dyn ProcessProvider>,
    pub probe: Arc<dyn MemoryProbe>,
    pub terminator: Arc<dyn Terminator>,
    pub reporter: Arc<dyn Reporter>,
}

/// Resets the phase to `Idle` when a round ends.
struct PhaseGuard<'a>(&'a ReclaimState);

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.0.set_phase(ScanPhase::Idle);
    }
}

/// Ties the tier table, adaptive threshold, selector and cooldown gate into
/// reclaim rounds.
pub struct ReclaimScheduler {
    /// Swapped whole on update; each round clones the `Arc` once
    config: RwLock<Arc<ReclaimConfig>>,
    state: Arc<ReclaimState>,
    signal: Arc<PressureSignal>,
    threshold: AdaptiveThreshold,
    collaborators: Collaborators,
    clock: Arc<dyn Clock>,
}

impl ReclaimScheduler {
    pub fn new(config: ReclaimConfig, collaborators: Collaborators) -> Self {
        Self::with_clock(config, collaborators, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ReclaimConfig, collaborators: Collaborators, clock: Arc<dyn Clock>) -> Self {
        let pressure = Arc::new(PressureState::new(&config));
        let signal = Arc::new(PressureSignal::new(
            pressure.clone(),
            &config,
            collaborators.reporter.clone(),
            clock.clone(),
        ));

        info!(
            tiers = config.tier_table().len(),
            adaptive = config.adaptive_enabled,
            batch = config.batch.enabled,
            "Reclaim scheduler created"
        );

        Self {
            config: RwLock::new(Arc::new(config)),
            threshold: AdaptiveThreshold::new(pressure.clone()),
            state: Arc::new(ReclaimState::new(pressure)),
            signal,
            collaborators,
            clock,
        }
    }

    /// Current configuration snapshot.
    #[must_use]
    pub fn config(&self) -> Arc<ReclaimConfig> {
        self.config.read().clone()
    }

    /// Handle for the OS pressure notifier.
    #[must_use]
    pub fn pressure_signal(&self) -> Arc<PressureSignal> {
        self.signal.clone()
    }

    #[must_use]
    pub fn state(&self) -> &Arc<ReclaimState> {
        &self.state
    }

    #[must_use]
    pub fn stats(&self) -> ReclaimStatsSnapshot {
        self.state.stats().snapshot()
    }

    #[must_use]
    pub fn phase(&self) -> ScanPhase {
        self.state.phase()
    }

    /// Validate and install a new configuration.
    ///
    /// Rounds already running finish on the snapshot they started with.
    pub fn update_config(&self, config: ReclaimConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.signal.apply_config(&config);
        *self.config.write() = Arc::new(config);
        debug!("Reclaim configuration updated");
        Ok(())
    }

    /// Apply every configuration published on `rx` until the sender is
    /// dropped. Invalid values are logged and skipped.
    pub fn watch_config(self: &Arc<Self>, mut rx: watch::Receiver<ReclaimConfig>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let config = rx.borrow_and_update().clone();
                if let Err(e) = scheduler.update_config(config) {
                    warn!(error = %e, "Rejected configuration update");
                }
            }
            debug!("Configuration channel closed");
        })
    }

    /// Run one reclaim round.
    pub fn reclaim(&self, request: &ScanRequest) -> ReclaimOutcome {
        let outcome = self.run_round(request);
        metrics::record_outcome(outcome.label());
        outcome
    }

    fn run_round(&self, request: &ScanRequest) -> ReclaimOutcome {
        if request.nr_to_scan == 0 {
            let estimate = self.collaborators.probe.sample().reclaimable_estimate();
            return ReclaimOutcome::CountOnly { estimate };
        }

        let Some(_scan) = self.state.exclusion().acquire(request.interrupt.as_ref()) else {
            self.state.stats().record_interrupted();
            debug!("Interrupted waiting for scan exclusion");
            return ReclaimOutcome::Interrupted;
        };
        let _phase = PhaseGuard(&self.state);
        self.state.set_phase(ScanPhase::Scanning);
        self.state.stats().record_round();
        let _timer = metrics::ScanTimer::new();

        let config = self.config();
        let memory = self.collaborators.probe.sample();
        let free = memory.free_pages;
        let other_file = memory.other_file();
        let estimate = memory.reclaimable_estimate();

        let table = config.tier_table();
        let (cutoff, adjustment) = self.threshold.compute_cutoff_for(table.lookup(free, other_file), &config);
        metrics::set_cutoff(cutoff.unwrap_or(CUTOFF_NONE));

        if adjustment.escalated() {
            self.state.stats().record_escalation();
            metrics::record_escalation_applied(adjustment.as_str());
            debug!(cutoff = ?cutoff, adjustment = adjustment.as_str(), "Pressure escalation applied");
        }

        let Some(cutoff) = cutoff else {
            trace!(
                nr_to_scan = request.nr_to_scan,
                free,
                other_file,
                estimate,
                "No reclaim due"
            );
            return ReclaimOutcome::NoReclaimDue { estimate };
        };

        let selector = VictimSelector::new(config.exemption_list());
        let mut excluded = HashSet::new();
        let mut kills: Vec<KillAttempt> = Vec::new();

        loop {
            let snapshot = self.collaborators.provider.enumerate();
            let now = self.clock.now();

            if !self.state.gate().try_enter(now, &snapshot) {
                if kills.is_empty() {
                    self.state.stats().record_cooling_down();
                    return ReclaimOutcome::CoolingDown;
                }
                break;
            }

            let Some(victim) =
                selector.scan_excluding(cutoff, &snapshot, &excluded, request.invoker.as_ref())
            else {
                break;
            };

            self.state.set_phase(ScanPhase::VictimSelected);
            let terminated = self.kill(&victim, cutoff, &memory, &selector, &config, now);
            excluded.insert(victim.id());
            let score = victim.score;
            kills.push(KillAttempt { victim, terminated });

            if !config.batch.should_continue(kills.len() as u32, score) {
                break;
            }
            self.state.set_phase(ScanPhase::Scanning);
        }

        if kills.is_empty() {
            trace!(cutoff, free, other_file, estimate, "No victim at cutoff");
            return ReclaimOutcome::NoVictim { cutoff, estimate };
        }

        let freed: u64 = kills
            .iter()
            .filter(|k| k.terminated)
            .map(|k| k.victim.footprint_pages())
            .sum();

        ReclaimOutcome::Killed {
            cutoff,
            adjustment,
            kills,
            estimate: estimate.saturating_sub(freed),
        }
    }

    /// Terminate one victim and record it. Returns whether the terminator
    /// accepted the kill; either way the victim is marked pending.
    fn kill(
        &self,
        victim: &Victim,
        cutoff: i32,
        memory: &MemoryStats,
        selector: &VictimSelector,
        config: &ReclaimConfig,
        now: Instant,
    ) -> bool {
        let candidate = &victim.candidate;
        let result = self.collaborators.terminator.terminate(candidate);
        self.state.gate().record_kill(candidate.id, now, config.kill_interval());

        if let Err(e) = result {
            warn!(
                victim = %candidate.display_name,
                id = candidate.id,
                error = %e,
                "Failed to terminate victim"
            );
            self.state.stats().record_termination_failure();
            metrics::record_termination_failure();
            return false;
        }

        self.state.stats().record_kill(candidate.footprint_pages);
        metrics::record_kill(victim.score, candidate.footprint_pages);

        self.collaborators.reporter.record_kill(&KillRecord {
            victim_name: candidate.display_name.clone(),
            victim_id: candidate.id,
            priority_score: victim.score,
            footprint_pages: candidate.footprint_pages,
            cutoff_used: cutoff,
            free_at_kill: memory.free_pages,
            file_at_kill: memory.other_file(),
            fallback: victim.fallback,
        });

        if selector.exemptions().is_exempt(&candidate.display_name) || victim.score < FOREGROUND_SCORE_LIMIT {
            self.report(Anomaly::ProtectedVictimKilled {
                victim_name: candidate.display_name.clone(),
                victim_id: candidate.id,
                score: victim.score,
            });
        }

        if config.debug_level >= 2 && victim.score == 0 {
            self.report(Anomaly::MemoryDumpRequested {
                victim_name: candidate.display_name.clone(),
                victim_id: candidate.id,
            });
        }
        true
    }

    fn report(&self, anomaly: Anomaly) {
        metrics::record_anomaly(anomaly.kind());
        self.collaborators.reporter.report_anomaly(&anomaly);
    }
}
