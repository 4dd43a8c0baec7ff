//! # Low-Memory Reclaim
//!
//! An adaptive low-memory process reclaimer. When the OS asks for memory back,
//! it picks the most expendable process and terminates it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    OS reclaim callback                      │
//! │  • ReclaimScheduler::reclaim(ScanRequest)                  │
//! │  • One round at a time (interruptible scan exclusion)      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Tier lookup                             │
//! │  • (free, file) against minfree floors → priority cutoff   │
//! │  • Adaptive threshold consumes a pending escalation        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │                ▲
//!                              │                │ escalation flag
//!                              ▼                │
//! ┌──────────────────────────────────┐  ┌──────────────────────┐
//! │        Victim selection          │  │   Pressure signal    │
//! │  • Cooldown gate                 │  │  • 0-100 level feed  │
//! │  • Exemption discount            │  │  • Rate anomalies    │
//! │  • Highest score, then largest   │  └──────────────────────┘
//! └──────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Terminator + Reporter                        │
//! │  • Kill, mark pending, start cooldown                      │
//! │  • Kill records and exception channel                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lowmem_reclaim::{
//!     Collaborators, FixedProbe, MemoryStats, ReclaimConfig, ReclaimScheduler,
//!     RecordingTerminator, ScanRequest, StaticProvider, TracingReporter,
//! };
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ReclaimConfig {
//!         adaptive_enabled: true,
//!         ..Default::default()
//!     };
//!
//!     let provider = Arc::new(StaticProvider::new(Vec::new()));
//!     let scheduler = Arc::new(ReclaimScheduler::new(
//!         config.clone(),
//!         Collaborators {
//!             provider: provider.clone(),
//!             probe: Arc::new(FixedProbe::new(MemoryStats::new(1000, 800))),
//!             terminator: Arc::new(RecordingTerminator::linked(provider)),
//!             reporter: Arc::new(TracingReporter),
//!         },
//!     ));
//!
//!     // Runtime tuning
//!     let (_tx, rx) = watch::channel(config);
//!     scheduler.watch_config(rx);
//!
//!     // OS pressure notifier
//!     scheduler.pressure_signal().on_pressure_sample(96, 1000, 800);
//!
//!     // OS reclaim callback
//!     let outcome = scheduler.reclaim(&ScanRequest::new(128));
//!     println!("{outcome}");
//! }
//! ```
//!
//! ## Modules
//!
//! - [`scheduler`]: The [`ReclaimScheduler`] driving reclaim rounds
//! - [`tiers`]: Tier table and cutoff lookup
//! - [`threshold`]: Adaptive cutoff escalation
//! - [`pressure`]: Pressure signal, escalation flag, rate anomalies
//! - [`selector`]: Victim selection and soft-protection exemptions
//! - [`cooldown`]: Anti-thrash gate between kills
//! - [`batch`]: Multi-kill batching policy
//! - [`providers`]: Process, memory and termination seams
//! - [`reporter`]: Kill records and the exception channel

pub mod batch;
pub mod clock;
pub mod config;
pub mod cooldown;
pub mod metrics;
pub mod pressure;
pub mod providers;
pub mod reporter;
pub mod scheduler;
pub mod selector;
pub mod threshold;
pub mod tiers;

pub use batch::BatchPolicy;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{parse_adj_list, parse_minfree_list, ConfigError, ReclaimConfig};
pub use cooldown::CooldownGate;
pub use pressure::{spawn_feed, PressureBand, PressureSample, PressureSignal, PressureState, RateWindow};
pub use providers::{
    FixedProbe, MemoryProbe, MemoryStats, ProcessProvider, RecordingTerminator, StaticProvider,
    TerminateError, Terminator,
};
pub use reporter::{Anomaly, KillRecord, RecordingReporter, Reporter, StatusReporter, TracingReporter};
pub use scheduler::{
    Collaborators, Interrupt, KillAttempt, ReclaimOutcome, ReclaimScheduler, ReclaimState,
    ReclaimStats, ReclaimStatsSnapshot, ScanPhase, ScanRequest,
};
pub use selector::{Candidate, ExemptionList, Victim, VictimSelector};
pub use threshold::{AdaptiveThreshold, Adjustment};
pub use tiers::{TierEntry, TierTable, CUTOFF_NONE, MAX_TIERS, SCORE_ADJ_MAX, SCORE_ADJ_MIN};
pub use crate::metrics::ScanTimer;
