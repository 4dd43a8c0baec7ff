// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic reclaimer usage example.
//!
//! Demonstrates:
//! 1. Wiring the scheduler to in-memory collaborators
//! 2. A pressure storm escalating the cutoff
//! 3. Reclaim rounds, cooldown and a batch kill
//! 4. Displaying kill records, anomalies and metrics
//!
//! # Run
//!
//! ```bash
//! cargo run --example basic_usage
//! ```

use std::sync::Arc;
use std::time::Duration;

use lowmem_reclaim::{
    BatchPolicy, Candidate, Collaborators, FixedProbe, ManualClock, MemoryStats, ReclaimConfig,
    ReclaimScheduler, RecordingReporter, RecordingTerminator, ScanRequest, StaticProvider,
};
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("failed to install metrics recorder");

    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(tracing::Level::DEBUG)
        .compact()
        .init();

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║           lowmem-reclaim: Basic Usage Example                 ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    // ─────────────────────────────────────────────────────────────────────────
    // 1. Collaborators and scheduler
    // ─────────────────────────────────────────────────────────────────────────
    let provider = Arc::new(StaticProvider::new(vec![
        Candidate::new(1, "init", -1000, 300),
        Candidate::new(2, "kswapd0", 0, 0).system(),
        Candidate::new(400, "launcher", 0, 20_000),
        Candidate::new(410, "vold", 150, 3_000),
        Candidate::new(500, "music", 200, 9_000),
        Candidate::new(600, "cached_browser", 906, 30_000),
        Candidate::new(601, "cached_mail", 906, 12_000),
        Candidate::new(602, "cached_maps", 800, 25_000),
    ]));
    let probe = Arc::new(FixedProbe::new(MemoryStats::new(80_000, 60_000)));
    let reporter = Arc::new(RecordingReporter::new());
    let clock = ManualClock::new();

    let config = ReclaimConfig {
        adaptive_enabled: true,
        ..Default::default()
    };
    let scheduler = ReclaimScheduler::with_clock(
        config.clone(),
        Collaborators {
            provider: provider.clone(),
            probe: probe.clone(),
            terminator: Arc::new(RecordingTerminator::linked(provider.clone())),
            reporter: reporter.clone(),
        },
        Arc::new(clock.clone()),
    );

    // ─────────────────────────────────────────────────────────────────────────
    // 2. Plenty of memory: nothing to do
    // ─────────────────────────────────────────────────────────────────────────
    println!("📊 Round with ample memory: {}", scheduler.reclaim(&ScanRequest::new(128)));

    // ─────────────────────────────────────────────────────────────────────────
    // 3. Pressure storm escalates the next round
    // ─────────────────────────────────────────────────────────────────────────
    let signal = scheduler.pressure_signal();
    for _ in 0..22 {
        signal.on_pressure_sample(97, 80_000, 60_000);
        clock.advance(Duration::from_millis(500));
    }
    println!("🌪  Escalated round: {}", scheduler.reclaim(&ScanRequest::new(128)));

    // ─────────────────────────────────────────────────────────────────────────
    // 4. Memory drops below the tiers; cooldown, then a batch
    // ─────────────────────────────────────────────────────────────────────────
    probe.set(MemoryStats::new(1_200, 900));
    println!("⏳ Inside cooldown: {}", scheduler.reclaim(&ScanRequest::new(128)));

    clock.advance(Duration::from_secs(1));
    provider.reap(600);
    scheduler.update_config(ReclaimConfig {
        batch: BatchPolicy {
            enabled: true,
            interval_ms: 0,
            ..Default::default()
        },
        ..config
    })?;
    println!("🔪 Batch round: {}", scheduler.reclaim(&ScanRequest::new(1024)));

    // ─────────────────────────────────────────────────────────────────────────
    // 5. What happened
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📝 Kill records:");
    for record in reporter.kills() {
        println!(
            "   {:<16} id={:<5} score={:<5} pages={:<6} cutoff={}",
            record.victim_name, record.victim_id, record.priority_score, record.footprint_pages, record.cutoff_used
        );
    }

    println!("\n⚠️  Anomalies:");
    for anomaly in reporter.anomalies() {
        println!("   {anomaly}");
    }

    println!("\n📈 Stats: {:?}", scheduler.stats());

    println!("\n📈 Metrics:");
    for (key, _, _, value) in snapshotter.snapshot().into_vec() {
        let value = match value {
            DebugValue::Counter(v) => v.to_string(),
            DebugValue::Gauge(v) => format!("{:.0}", v.into_inner()),
            DebugValue::Histogram(v) => format!("{} samples", v.len()),
        };
        println!("   {:<40} {}", key.key().name(), value);
    }

    Ok(())
}
