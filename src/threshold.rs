// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Adaptive cutoff.
//!
//! The single point where the pressure signal perturbs the table-driven
//! cutoff. A consumed escalation can only make the cutoff stricter (lower),
//! never looser.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use lowmem_reclaim::{AdaptiveThreshold, Adjustment, PressureState, ReclaimConfig};
//!
//! let config = ReclaimConfig { adaptive_enabled: true, ..Default::default() };
//! let state = Arc::new(PressureState::new(&config));
//! let threshold = AdaptiveThreshold::new(state.clone());
//!
//! state.request_shift();
//! assert_eq!(threshold.compute_cutoff(None, 353), (Some(353), Adjustment::Encroach));
//! // the request was consumed
//! assert_eq!(threshold.compute_cutoff(None, 353), (None, Adjustment::None));
//! ```

use serde::Serialize;
use std::sync::Arc;

use crate::config::ReclaimConfig;
use crate::pressure::PressureState;

/// How the cutoff was changed by a consumed escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Adjustment {
    /// Table cutoff used as-is
    None,
    /// No tier matched; escalation created a cutoff out of nothing
    Encroach,
    /// A looser tier cutoff was tightened to the escalation limit
    Normal,
}

impl Adjustment {
    #[must_use]
    pub fn escalated(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Encroach => "encroach",
            Self::Normal => "normal",
        }
    }
}

/// Combines the tier cutoff with the pressure escalation flag.
#[derive(Debug, Clone)]
pub struct AdaptiveThreshold {
    state: Arc<PressureState>,
}

impl AdaptiveThreshold {
    pub fn new(state: Arc<PressureState>) -> Self {
        Self { state }
    }

    /// Effective cutoff for this scan.
    ///
    /// `candidate` is the tier lookup result (`None` = no reclaim due). With
    /// adaptive mode on, the escalation flag is consumed whether or not it
    /// changes anything.
    #[must_use]
    pub fn compute_cutoff(&self, candidate: Option<i32>, escalation_limit: i32) -> (Option<i32>, Adjustment) {
        self.compute(candidate, escalation_limit, self.state.adaptive_enabled())
    }

    /// Same as [`compute_cutoff`](Self::compute_cutoff), with the limit and
    /// the adaptive switch taken from a config snapshot instead of the
    /// mirrored pressure state.
    #[must_use]
    pub fn compute_cutoff_for(&self, candidate: Option<i32>, config: &ReclaimConfig) -> (Option<i32>, Adjustment) {
        self.compute(candidate, config.escalation_limit, config.adaptive_enabled)
    }

    fn compute(&self, candidate: Option<i32>, escalation_limit: i32, adaptive: bool) -> (Option<i32>, Adjustment) {
        if !adaptive {
            return (candidate, Adjustment::None);
        }

        let shift = self.state.take_shift();
        if !shift {
            return (candidate, Adjustment::None);
        }

        match candidate {
            None => (Some(escalation_limit), Adjustment::Encroach),
            Some(cutoff) if cutoff > escalation_limit => (Some(escalation_limit), Adjustment::Normal),
            Some(cutoff) => (Some(cutoff), Adjustment::None),
        }
    }
}
