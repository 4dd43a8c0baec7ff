// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the reclaimer.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding daemon is responsible for choosing the exporter.
//!
//! # Metric Naming Convention
//! - `lmk_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//! - `_pages` suffix for page-count values
//!
//! # Labels
//! - `outcome`: interrupted, no_reclaim_due, no_victim, cooling_down, killed, count_only
//! - `band`: moderate, severe
//! - `adjustment`: encroach, normal
//! - `kind`: rate, protected_kill, memory_dump

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

use crate::pressure::PressureBand;

/// Record how a reclaim round ended
pub fn record_outcome(outcome: &'static str) {
    counter!("lmk_rounds_total", "outcome" => outcome).increment(1);
}

/// Record one kill and the pages it should release
pub fn record_kill(score: i32, footprint_pages: u64) {
    counter!("lmk_kills_total").increment(1);
    counter!("lmk_killed_pages_total").increment(footprint_pages);
    histogram!("lmk_victim_score").record(score as f64);
}

/// Record a failed termination attempt
pub fn record_termination_failure() {
    counter!("lmk_termination_failures_total").increment(1);
}

/// Set the cutoff used by the latest round
pub fn set_cutoff(cutoff: i32) {
    gauge!("lmk_cutoff").set(cutoff as f64);
}

/// Set the latest pressure level (0 - 100)
pub fn set_pressure_level(level: u8) {
    gauge!("lmk_pressure_level").set(level as f64);
}

/// Record an escalation request from the pressure path
pub fn record_escalation_requested(band: PressureBand) {
    let band = match band {
        PressureBand::Relief => "relief",
        PressureBand::Moderate => "moderate",
        PressureBand::Severe => "severe",
    };
    counter!("lmk_escalations_requested_total", "band" => band).increment(1);
}

/// Record an escalation that changed a round's cutoff
pub fn record_escalation_applied(adjustment: &'static str) {
    counter!("lmk_escalations_applied_total", "adjustment" => adjustment).increment(1);
}

/// Record an exception-channel event
pub fn record_anomaly(kind: &'static str) {
    counter!("lmk_anomalies_total", "kind" => kind).increment(1);
}

/// Record how long a round held the scan exclusion
pub fn record_scan_latency(duration: Duration) {
    histogram!("lmk_scan_seconds").record(duration.as_secs_f64());
}

/// A timing guard that records scan latency on drop
pub struct ScanTimer {
    start: Instant,
}

impl ScanTimer {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for ScanTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScanTimer {
    fn drop(&mut self) {
        record_scan_latency(self.start.elapsed());
    }
}
