// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::cooldown::CooldownGate;
use crate::pressure::PressureState;
use crate::scheduler::exclusion::ScanExclusion;
use crate::scheduler::stats::ReclaimStats;
use crate::scheduler::types::ScanPhase;

/// Everything one reclaimer instance shares between its callers.
///
/// A daemon owns exactly one of these; tests build as many as they like.
#[derive(Debug)]
pub struct ReclaimState {
    pressure: Arc<PressureState>,
    gate: CooldownGate,
    exclusion: ScanExclusion,
    stats: ReclaimStats,
    phase: AtomicU8,
}

impl ReclaimState {
    pub fn new(pressure: Arc<PressureState>) -> Self {
        Self {
            pressure,
            gate: CooldownGate::new(),
            exclusion: ScanExclusion::new(),
            stats: ReclaimStats::new(),
            phase: AtomicU8::new(ScanPhase::Idle.as_u8()),
        }
    }

    #[must_use]
    pub fn pressure(&self) -> &Arc<PressureState> {
        &self.pressure
    }

    #[must_use]
    pub fn gate(&self) -> &CooldownGate {
        &self.gate
    }

    #[must_use]
    pub fn exclusion(&self) -> &ScanExclusion {
        &self.exclusion
    }

    #[must_use]
    pub fn stats(&self) -> &ReclaimStats {
        &self.stats
    }

    #[must_use]
    pub fn phase(&self) -> ScanPhase {
        ScanPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub(crate) fn set_phase(&self, phase: ScanPhase) {
        self.phase.store(phase.as_u8(), Ordering::Release);
    }
}
