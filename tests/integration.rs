//! Integration Tests for the Reclaim Scheduler
//!
//! End-to-end rounds against the in-memory collaborators, with simulated
//! time through `ManualClock`. Nothing here needs a real process table.
//!
//! # Running Tests
//! ```bash
//! cargo test --test integration
//!
//! # Only the documented scenarios
//! cargo test --test integration scenario
//! ```
//!
//! # Test Organization
//! - `scenario_*` - the documented behavior scenarios (A-E)
//! - `happy_*` - normal operation: kills, batching, escalation, reload
//! - `edge_*` - idempotence, fallbacks, count-only queries

use std::sync::Arc;
use std::time::Duration;

use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use tokio::sync::{mpsc, watch};

use lowmem_reclaim::{
    spawn_feed, Adjustment, Anomaly, BatchPolicy, Candidate, Clock, Collaborators, CooldownGate,
    ExemptionList, FixedProbe, ManualClock, MemoryStats, PressureSample, ReclaimConfig,
    ReclaimOutcome, ReclaimScheduler, RecordingReporter, RecordingTerminator, ScanRequest,
    StaticProvider, TierTable, VictimSelector,
};

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    scheduler: Arc<ReclaimScheduler>,
    provider: Arc<StaticProvider>,
    probe: Arc<FixedProbe>,
    terminator: Arc<RecordingTerminator>,
    reporter: Arc<RecordingReporter>,
    clock: ManualClock,
}

fn harness(config: ReclaimConfig, processes: Vec<Candidate>, memory: MemoryStats) -> Harness {
    let provider = Arc::new(StaticProvider::new(processes));
    let probe = Arc::new(FixedProbe::new(memory));
    let terminator = Arc::new(RecordingTerminator::linked(provider.clone()));
    let reporter = Arc::new(RecordingReporter::new());
    let clock = ManualClock::new();

    let scheduler = ReclaimScheduler::with_clock(
        config,
        Collaborators {
            provider: provider.clone(),
            probe: probe.clone(),
            terminator: terminator.clone(),
            reporter: reporter.clone(),
        },
        Arc::new(clock.clone()),
    );

    Harness {
        scheduler: Arc::new(scheduler),
        provider,
        probe,
        terminator,
        reporter,
        clock,
    }
}

/// Low memory: matches every tier of the default table.
fn low_memory() -> MemoryStats {
    MemoryStats::new(1000, 500)
}

fn ample_memory() -> MemoryStats {
    MemoryStats::new(500_000, 500_000)
}

fn phone() -> Vec<Candidate> {
    vec![
        Candidate::new(1, "init", -1000, 200),
        Candidate::new(2, "kswapd0", 0, 0).system(),
        Candidate::new(300, "system_server", -900, 60_000),
        Candidate::new(400, "launcher", 0, 20_000),
        Candidate::new(500, "camera", 200, 9_000),
        Candidate::new(600, "cached_browser", 906, 30_000),
        Candidate::new(601, "cached_mail", 906, 12_000),
    ]
}

// =============================================================================
// Documented Scenarios
// =============================================================================

#[test]
fn scenario_a_last_matching_tier_wins() {
    let table = TierTable::new(&[0, 1, 6, 12], &[1536, 2048, 4096, 16384]);
    // free=1000, file=500 is below every floor: the last entry is the most severe match
    assert_eq!(table.lookup(1000, 500), Some(12));

    // with the minfree table cut to three entries, the 4096 tier is the last one
    let clamped = TierTable::new(&[0, 1, 6, 12], &[1536, 2048, 4096]);
    assert_eq!(clamped.lookup(1000, 500), Some(6));

    let config = ReclaimConfig {
        minfree: vec![1536, 2048, 4096],
        ..Default::default()
    };
    let h = harness(config, phone(), low_memory());
    h.scheduler.reclaim(&ScanRequest::new(128));
    assert_eq!(h.reporter.kills()[0].cutoff_used, 6);
}

#[test]
fn scenario_b_severe_pressure_encroaches() {
    let config = ReclaimConfig {
        adaptive_enabled: true,
        ..Default::default()
    };
    let h = harness(config, phone(), ample_memory());

    let signal = h.scheduler.pressure_signal();
    assert!(signal.on_pressure_sample(96, 500_000, 500_000));
    assert!(signal.state().shift_requested());

    let outcome = h.scheduler.reclaim(&ScanRequest::new(128));
    match outcome {
        ReclaimOutcome::Killed { cutoff, adjustment, ref kills, .. } => {
            assert_eq!(cutoff, 353);
            assert_eq!(adjustment, Adjustment::Encroach);
            assert_eq!(kills[0].victim.id(), 600);
        }
        other => panic!("expected a kill, got {other:?}"),
    }
    assert!(!signal.state().shift_requested());
    assert_eq!(h.scheduler.stats().escalations_applied, 1);
}

#[test]
fn scenario_c_tie_breaks_on_footprint() {
    let selector = VictimSelector::new(ExemptionList::none());
    let candidates = vec![
        Candidate::new(1, "small", 100, 500),
        Candidate::new(2, "large", 100, 800),
    ];

    let victim = selector.scan(50, &candidates).unwrap();
    assert_eq!(victim.id(), 2);
    assert_eq!(victim.footprint_pages(), 800);
}

#[test]
fn scenario_d_pressure_storm_reports_once_per_window() {
    let config = ReclaimConfig {
        adaptive_enabled: true,
        ..Default::default()
    };
    let h = harness(config, phone(), ample_memory());
    let signal = h.scheduler.pressure_signal();

    // 25 samples over 25 simulated seconds
    for i in 0..25 {
        signal.on_pressure_sample(96, 0, 0);
        let anomalies = h.reporter.anomalies().len();
        if i < 19 {
            assert_eq!(anomalies, 0, "tripped early at sample {}", i + 1);
        } else {
            assert_eq!(anomalies, 1);
        }
        h.clock.advance(Duration::from_secs(1));
    }
    assert_eq!(
        h.reporter.anomalies(),
        vec![Anomaly::RateAnomaly { samples: 20, window: Duration::from_secs(30) }]
    );

    // quiet for a full window, then another storm
    h.clock.advance(Duration::from_secs(30));
    for _ in 0..20 {
        signal.on_pressure_sample(96, 0, 0);
    }
    assert_eq!(h.reporter.anomalies().len(), 2);
}

#[test]
fn scenario_e_cooldown_window() {
    let gate = CooldownGate::new();
    let clock = ManualClock::new();
    let snapshot = vec![Candidate::new(7, "victim", 900, 100)];

    gate.record_kill(7, clock.now(), Duration::from_secs(1));
    clock.advance(Duration::from_millis(500));
    assert!(!gate.try_enter(clock.now(), &snapshot));
    clock.advance(Duration::from_millis(600));
    assert!(gate.try_enter(clock.now(), &snapshot));

    // same window through the scheduler
    let h = harness(ReclaimConfig::default(), phone(), low_memory());
    assert_eq!(h.scheduler.reclaim(&ScanRequest::new(128)).victim_ids(), vec![600]);
    h.clock.advance(Duration::from_millis(500));
    assert_eq!(h.scheduler.reclaim(&ScanRequest::new(128)), ReclaimOutcome::CoolingDown);
    h.clock.advance(Duration::from_millis(600));
    // 600 is still dying but the deadline has passed
    let outcome = h.scheduler.reclaim(&ScanRequest::new(128));
    assert!(matches!(outcome, ReclaimOutcome::Killed { .. }));
}

// =============================================================================
// Happy Paths
// =============================================================================

#[test]
fn happy_kill_record_carries_round_context() {
    let h = harness(ReclaimConfig::default(), phone(), low_memory());
    h.scheduler.reclaim(&ScanRequest::new(128));

    let record = &h.reporter.kills()[0];
    assert_eq!(record.victim_name, "cached_browser");
    assert_eq!(record.victim_id, 600);
    assert_eq!(record.priority_score, 906);
    assert_eq!(record.footprint_pages, 30_000);
    assert_eq!(record.cutoff_used, 12);
    assert_eq!(record.free_at_kill, 1000);
    assert_eq!(record.file_at_kill, 500);
    assert!(!record.fallback);
}

#[test]
fn happy_batch_kills_up_to_high_count() {
    let config = ReclaimConfig {
        batch: BatchPolicy {
            enabled: true,
            interval_ms: 0,
            ..Default::default()
        },
        ..Default::default()
    };
    let processes = (0..8)
        .map(|i| Candidate::new(1000 + i, format!("cached_{i}"), 900 - i as i32 * 10, 1000))
        .collect();
    let h = harness(config, processes, low_memory());

    let outcome = h.scheduler.reclaim(&ScanRequest::new(1024));
    assert_eq!(outcome.victim_ids(), vec![1000, 1001, 1002, 1003, 1004]);
    assert_eq!(h.scheduler.stats().kills, 5);
}

#[test]
fn happy_batch_limit_follows_last_victim_score() {
    let config = ReclaimConfig {
        batch: BatchPolicy {
            enabled: true,
            interval_ms: 0,
            ..Default::default()
        },
        ..Default::default()
    };
    let processes = vec![
        Candidate::new(1, "service_a", 300, 1000),
        Candidate::new(2, "service_b", 250, 1000),
        Candidate::new(3, "service_c", 200, 1000),
        Candidate::new(4, "service_d", 180, 1000),
    ];
    let h = harness(config, processes, low_memory());

    let outcome = h.scheduler.reclaim(&ScanRequest::new(1024));
    assert_eq!(outcome.victim_ids(), vec![1, 2, 3]);
}

#[test]
fn happy_batch_stops_at_cooldown() {
    let config = ReclaimConfig {
        batch: BatchPolicy {
            enabled: true,
            interval_ms: 1000,
            ..Default::default()
        },
        ..Default::default()
    };
    let h = harness(config, phone(), low_memory());

    // the first kill leaves a dying process inside the interval
    let outcome = h.scheduler.reclaim(&ScanRequest::new(1024));
    assert_eq!(outcome.victim_ids(), vec![600]);
}

#[tokio::test]
async fn happy_pressure_feed_escalates_next_round() {
    let config = ReclaimConfig {
        adaptive_enabled: true,
        ..Default::default()
    };
    let h = harness(config, phone(), ample_memory());

    let (tx, rx) = mpsc::channel(16);
    let feed = spawn_feed(h.scheduler.pressure_signal(), rx);
    tx.send(PressureSample::new(97, 0, 0)).await.unwrap();
    drop(tx);
    assert_eq!(feed.await.unwrap(), 1);

    assert_eq!(h.scheduler.reclaim(&ScanRequest::new(128)).victim_ids(), vec![600]);
    // consumed: ample memory and no new escalation
    assert!(matches!(
        h.scheduler.reclaim(&ScanRequest::new(128)),
        ReclaimOutcome::NoReclaimDue { .. }
    ));
}

#[test]
fn happy_relief_cancels_escalation_before_round() {
    let config = ReclaimConfig {
        adaptive_enabled: true,
        ..Default::default()
    };
    let h = harness(config, phone(), ample_memory());
    let signal = h.scheduler.pressure_signal();

    signal.on_pressure_sample(99, 0, 0);
    signal.on_pressure_sample(40, 0, 0);

    assert!(matches!(
        h.scheduler.reclaim(&ScanRequest::new(128)),
        ReclaimOutcome::NoReclaimDue { .. }
    ));
    assert!(h.terminator.calls().is_empty());
}

#[tokio::test]
async fn happy_config_reload_through_watch_channel() {
    let h = harness(ReclaimConfig::default(), phone(), MemoryStats::new(30_000, 30_000));
    let (tx, rx) = watch::channel(ReclaimConfig::default());
    let watcher = h.scheduler.watch_config(rx);

    assert!(matches!(
        h.scheduler.reclaim(&ScanRequest::new(128)),
        ReclaimOutcome::NoReclaimDue { .. }
    ));

    tx.send(ReclaimConfig {
        minfree: vec![1536, 2048, 4096, 32_768],
        ..Default::default()
    })
    .unwrap();
    drop(tx);
    watcher.await.unwrap();

    assert_eq!(h.scheduler.reclaim(&ScanRequest::new(128)).victim_ids(), vec![600]);
}

#[tokio::test]
async fn happy_invalid_reload_is_ignored() {
    let h = harness(ReclaimConfig::default(), phone(), low_memory());
    let (tx, rx) = watch::channel(ReclaimConfig::default());
    let watcher = h.scheduler.watch_config(rx);

    tx.send(ReclaimConfig {
        minfree: vec![4096, 2048, 1536, 1024],
        ..Default::default()
    })
    .unwrap();
    drop(tx);
    watcher.await.unwrap();

    assert_eq!(h.scheduler.config().minfree, vec![1536, 2048, 4096, 16384]);
}

#[test]
fn happy_exempt_process_is_discounted_and_reported() {
    let config = ReclaimConfig {
        exemptions: vec!["vold".into()],
        ..Default::default()
    };
    let processes = vec![
        Candidate::new(10, "vold", 150, 5000),
        Candidate::new(11, "widget", 120, 100),
    ];
    let h = harness(config, processes, low_memory());

    // vold drops to its threshold of 100 and loses to widget at 120
    assert_eq!(h.scheduler.reclaim(&ScanRequest::new(128)).victim_ids(), vec![11]);

    h.provider.reap(11);
    h.clock.advance(Duration::from_secs(2));
    assert_eq!(h.scheduler.reclaim(&ScanRequest::new(128)).victim_ids(), vec![10]);

    let protected: Vec<_> = h
        .reporter
        .anomalies()
        .into_iter()
        .filter(|a| matches!(a, Anomaly::ProtectedVictimKilled { victim_id: 10, .. }))
        .collect();
    assert_eq!(protected.len(), 1);
}

#[test]
fn happy_metrics_are_recorded() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let h = harness(ReclaimConfig::default(), phone(), low_memory());

    metrics::with_local_recorder(&recorder, || {
        h.scheduler.reclaim(&ScanRequest::new(128));
    });

    let snapshot = snapshotter.snapshot().into_vec();
    let kills = snapshot
        .iter()
        .find(|(key, _, _, _)| key.key().name() == "lmk_kills_total")
        .map(|(_, _, _, value)| value);
    assert_eq!(kills, Some(&DebugValue::Counter(1)));

    let freed = snapshot
        .iter()
        .find(|(key, _, _, _)| key.key().name() == "lmk_killed_pages_total")
        .map(|(_, _, _, value)| value);
    assert_eq!(freed, Some(&DebugValue::Counter(30_000)));
}

// =============================================================================
// Edge Cases
// =============================================================================

#[test]
fn edge_no_victim_is_idempotent() {
    let processes = vec![
        Candidate::new(1, "init", -1000, 200),
        Candidate::new(2, "foreground", 0, 5000),
    ];
    let h = harness(ReclaimConfig::default(), processes, low_memory());

    let first = h.scheduler.reclaim(&ScanRequest::new(128));
    assert_eq!(first, ReclaimOutcome::NoVictim { cutoff: 12, estimate: 0 });
    for _ in 0..10 {
        assert_eq!(h.scheduler.reclaim(&ScanRequest::new(128)), first);
    }
    assert!(h.terminator.calls().is_empty());
    assert!(h.reporter.kills().is_empty());
}

#[test]
fn edge_invoker_fallback_only_at_zero_cutoff() {
    let config = ReclaimConfig {
        adj: vec![0],
        minfree: vec![4096],
        ..Default::default()
    };
    let processes = vec![Candidate::new(1, "init", -1000, 200)];
    let h = harness(config, processes, low_memory());
    let invoker = Candidate::new(77, "allocator", -100, 3000);

    let outcome = h
        .scheduler
        .reclaim(&ScanRequest::new(128).with_invoker(invoker.clone()));
    assert_eq!(outcome.victim_ids(), vec![77]);
    assert!(h.reporter.kills()[0].fallback);

    // default table resolves to 12: no fallback
    let h = harness(ReclaimConfig::default(), vec![], low_memory());
    let outcome = h.scheduler.reclaim(&ScanRequest::new(128).with_invoker(invoker));
    assert!(matches!(outcome, ReclaimOutcome::NoVictim { .. }));
}

#[test]
fn edge_count_only_leaves_pressure_flag_alone() {
    let config = ReclaimConfig {
        adaptive_enabled: true,
        ..Default::default()
    };
    let memory = MemoryStats {
        active_anon: 100,
        inactive_anon: 200,
        active_file: 300,
        inactive_file: 400,
        ..MemoryStats::new(1000, 500)
    };
    let h = harness(config, phone(), memory);
    h.scheduler.pressure_signal().on_pressure_sample(99, 0, 0);

    let outcome = h.scheduler.reclaim(&ScanRequest::count_only());
    assert_eq!(outcome, ReclaimOutcome::CountOnly { estimate: 1000 });
    assert!(h.scheduler.pressure_signal().state().shift_requested());
    assert!(h.terminator.calls().is_empty());
}

#[test]
fn edge_estimate_subtracts_killed_footprint() {
    let memory = MemoryStats {
        active_anon: 40_000,
        inactive_file: 10_000,
        ..low_memory()
    };
    let h = harness(ReclaimConfig::default(), phone(), memory);
    assert_eq!(h.scheduler.reclaim(&ScanRequest::new(128)).pages(), 20_000);

    h.probe.set(MemoryStats { active_anon: 100, ..low_memory() });
    h.provider.reap(600);
    h.clock.advance(Duration::from_secs(1));
    // 601 is 12_000 pages; saturates at zero
    assert_eq!(h.scheduler.reclaim(&ScanRequest::new(128)).pages(), 0);
}
