// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Asynchronous pressure signal.
//!
//! The OS pushes `(level, free, file)` samples at its own pace. Samples never
//! take the scan exclusion: they only raise or cancel a single
//! consume-once escalation flag in [`PressureState`], which the next cutoff
//! computation reads and clears.
//!
//! ```text
//!   level >= 95        → request escalation
//!   90 <= level < 95   → request escalation if free < last tier floor
//!                        and file < file_min_floor
//!   level < 90         → cancel a pending escalation
//! ```
//!
//! Samples in an escalating band also feed a [`RateWindow`], whether or not
//! adaptive mode is on; a burst of them is reported once on the anomaly
//! channel.

mod anomaly;
mod band;
mod state;

pub use anomaly::RateWindow;
pub use band::PressureBand;
pub use state::PressureState;

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::clock::Clock;
use crate::config::ReclaimConfig;
use crate::metrics;
use crate::reporter::{Anomaly, Reporter};

/// One pressure sample as delivered by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressureSample {
    /// 0-100
    pub level: u8,
    pub free_pages: u64,
    pub file_pages: u64,
}

impl PressureSample {
    pub fn new(level: u8, free_pages: u64, file_pages: u64) -> Self {
        Self { level, free_pages, file_pages }
    }
}

/// Consumes pressure samples and raises the escalation flag.
pub struct PressureSignal {
    state: Arc<PressureState>,
    rate: Mutex<RateWindow>,
    reporter: Arc<dyn Reporter>,
    clock: Arc<dyn Clock>,
}

impl PressureSignal {
    pub fn new(
        state: Arc<PressureState>,
        config: &ReclaimConfig,
        reporter: Arc<dyn Reporter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state,
            rate: Mutex::new(RateWindow::new(config.anomaly_threshold, config.anomaly_window())),
            reporter,
            clock,
        }
    }

    #[must_use]
    pub fn state(&self) -> &Arc<PressureState> {
        &self.state
    }

    /// Pick up new tunables.
    pub fn apply_config(&self, config: &ReclaimConfig) {
        self.state.apply_config(config);
        self.rate
            .lock()
            .retune(config.anomaly_threshold, config.anomaly_window());
    }

    /// Handle one sample. Returns whether it requested an escalation.
    ///
    /// Samples in an escalating band feed the rate window even with
    /// adaptive mode off; only the flag itself depends on it.
    pub fn on_pressure_sample(&self, level: u8, free_pages: u64, file_pages: u64) -> bool {
        let band = PressureBand::from_level(level);
        metrics::set_pressure_level(level);

        let escalate = match band {
            PressureBand::Severe => true,
            PressureBand::Moderate => {
                free_pages < self.state.last_tier_floor() && file_pages < self.state.file_min_floor()
            }
            PressureBand::Relief => false,
        };

        if escalate {
            self.observe_rate();
        }

        if !self.state.adaptive_enabled() {
            return false;
        }

        if band.cancels_escalation() {
            if self.state.take_shift() {
                trace!(level, free_pages, file_pages, "Pressure relieved, pending escalation cancelled");
            }
            return false;
        }

        if !escalate {
            return false;
        }

        self.state.request_shift();
        metrics::record_escalation_requested(band);
        trace!(level, free_pages, file_pages, %band, "Escalation requested");
        true
    }

    fn observe_rate(&self) {
        let tripped = {
            let mut rate = self.rate.lock();
            rate.observe(self.clock.now()).map(|samples| (samples, rate.window()))
        };
        if let Some((samples, window)) = tripped {
            metrics::record_anomaly("rate");
            self.reporter
                .report_anomaly(&Anomaly::RateAnomaly { samples, window });
        }
    }

    pub fn on_sample(&self, sample: &PressureSample) -> bool {
        self.on_pressure_sample(sample.level, sample.free_pages, sample.file_pages)
    }
}

/// Apply every sample from `rx` to `signal` until the sender side closes.
///
/// Resolves to the number of samples applied.
pub fn spawn_feed(signal: Arc<PressureSignal>, mut rx: mpsc::Receiver<PressureSample>) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut applied = 0u64;
        while let Some(sample) = rx.recv().await {
            signal.on_sample(&sample);
            applied += 1;
        }
        debug!(applied, "Pressure feed closed");
        applied
    })
}
