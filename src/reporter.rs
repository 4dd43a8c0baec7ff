// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Kill records and the exception channel.
//!
//! Every kill produces a [`KillRecord`]. Conditions worth a human look
//! (pressure storms, protected processes being killed) go to the lower
//! volume [`Anomaly`] channel. What a sink does with them is up to the
//! embedding daemon; [`TracingReporter`] just logs.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// One kill decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KillRecord {
    pub victim_name: String,
    pub victim_id: u32,
    pub priority_score: i32,
    pub footprint_pages: u64,
    pub cutoff_used: i32,
    pub free_at_kill: u64,
    pub file_at_kill: u64,
    /// The invoking process was killed because nothing else qualified
    pub fallback: bool,
}

/// Exception-channel events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Anomaly {
    /// Escalating pressure samples arrived faster than reclaim can act
    RateAnomaly { samples: u32, window: Duration },
    /// A soft-protected or foreground-class process was killed
    ProtectedVictimKilled { victim_name: String, victim_id: u32, score: i32 },
    /// A score-0 process was killed with verbose diagnostics enabled
    MemoryDumpRequested { victim_name: String, victim_id: u32 },
}

impl Anomaly {
    /// Short category label for metrics and sinks.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RateAnomaly { .. } => "rate",
            Self::ProtectedVictimKilled { .. } => "protected_kill",
            Self::MemoryDumpRequested { .. } => "memory_dump",
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::RateAnomaly { samples, window } => format!(
                "{} escalating pressure samples within {:?}",
                samples, window
            ),
            Self::ProtectedVictimKilled { victim_name, victim_id, score } => format!(
                "the process '{}' pid '{}' adj '{}' is killed by lmk",
                victim_name, victim_id, score
            ),
            Self::MemoryDumpRequested { victim_name, victim_id } => format!(
                "lower memory killer exception: '{}' ({}) killed at score 0",
                victim_name, victim_id
            ),
        }
    }
}

impl std::fmt::Display for Anomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind(), self.message())
    }
}

/// Sink for kill records and anomalies.
///
/// Called on the reclaim path: implementations must not block on memory.
pub trait Reporter: Send + Sync {
    fn record_kill(&self, record: &KillRecord);
    fn report_anomaly(&self, anomaly: &Anomaly);
}

/// Logs everything through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn record_kill(&self, record: &KillRecord) {
        info!(
            victim = %record.victim_name,
            id = record.victim_id,
            score = record.priority_score,
            size_pages = record.footprint_pages,
            cutoff = record.cutoff_used,
            free = record.free_at_kill,
            file = record.file_at_kill,
            fallback = record.fallback,
            "Killed process"
        );
    }

    fn report_anomaly(&self, anomaly: &Anomaly) {
        warn!(kind = anomaly.kind(), "{}", anomaly.message());
    }
}

/// Keeps everything in memory. Useful for tests and for daemons that drain
/// records on their own schedule.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    kills: Mutex<Vec<KillRecord>>,
    anomalies: Mutex<Vec<Anomaly>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kills(&self) -> Vec<KillRecord> {
        self.kills.lock().clone()
    }

    pub fn anomalies(&self) -> Vec<Anomaly> {
        self.anomalies.lock().clone()
    }

    pub fn clear(&self) {
        self.kills.lock().clear();
        self.anomalies.lock().clear();
    }
}

impl Reporter for RecordingReporter {
    fn record_kill(&self, record: &KillRecord) {
        self.kills.lock().push(record.clone());
    }

    fn report_anomaly(&self, anomaly: &Anomaly) {
        self.anomalies.lock().push(anomaly.clone());
    }
}

/// Forwards to an inner reporter and remembers the latest anomaly message
/// until it is read, like a status file that empties on read.
pub struct StatusReporter {
    inner: Arc<dyn Reporter>,
    status: Mutex<String>,
}

impl StatusReporter {
    pub fn new(inner: Arc<dyn Reporter>) -> Self {
        Self {
            inner,
            status: Mutex::new(String::new()),
        }
    }

    /// Latest anomaly message; empty if none since the last read.
    pub fn take_status(&self) -> String {
        std::mem::take(&mut *self.status.lock())
    }
}

impl Reporter for StatusReporter {
    fn record_kill(&self, record: &KillRecord) {
        self.inner.record_kill(record);
    }

    fn report_anomaly(&self, anomaly: &Anomaly) {
        *self.status.lock() = anomaly.message();
        self.inner.report_anomaly(anomaly);
    }
}
