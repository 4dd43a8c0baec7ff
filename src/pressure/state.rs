// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};

use crate::config::ReclaimConfig;

/// Shared escalation state.
///
/// Written by the pressure path, read-and-cleared by the cutoff
/// computation. Everything is a plain atomic: a lost or late update costs
/// at most one scan with the wrong cutoff.
#[derive(Debug)]
pub struct PressureState {
    shift_requested: AtomicBool,
    adaptive_enabled: AtomicBool,
    max_shift_cutoff: AtomicI32,
    file_min_floor: AtomicU64,
    /// Floor of the last effective tier, mirrored from the config
    last_tier_floor: AtomicU64,
}

impl PressureState {
    pub fn new(config: &ReclaimConfig) -> Self {
        let state = Self {
            shift_requested: AtomicBool::new(false),
            adaptive_enabled: AtomicBool::new(false),
            max_shift_cutoff: AtomicI32::new(0),
            file_min_floor: AtomicU64::new(0),
            last_tier_floor: AtomicU64::new(0),
        };
        state.apply_config(config);
        state
    }

    /// Mirror the tunables the pressure path needs.
    pub fn apply_config(&self, config: &ReclaimConfig) {
        self.adaptive_enabled.store(config.adaptive_enabled, Ordering::Release);
        self.max_shift_cutoff.store(config.escalation_limit, Ordering::Release);
        self.file_min_floor.store(config.file_min_floor, Ordering::Release);
        self.last_tier_floor
            .store(config.tier_table().last_floor().unwrap_or(0), Ordering::Release);
    }

    #[must_use]
    pub fn adaptive_enabled(&self) -> bool {
        self.adaptive_enabled.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn max_shift_cutoff(&self) -> i32 {
        self.max_shift_cutoff.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn file_min_floor(&self) -> u64 {
        self.file_min_floor.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn last_tier_floor(&self) -> u64 {
        self.last_tier_floor.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn shift_requested(&self) -> bool {
        self.shift_requested.load(Ordering::Acquire)
    }

    pub fn request_shift(&self) {
        self.shift_requested.store(true, Ordering::Release);
    }

    /// Read and clear the request in one step. Returns whether one was pending.
    pub fn take_shift(&self) -> bool {
        self.shift_requested.swap(false, Ordering::AcqRel)
    }
}
