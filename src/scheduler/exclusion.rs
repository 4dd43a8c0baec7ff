// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Process-wide scan exclusion.
//!
//! Only one round may be scanning at a time. Waiting is blocking but
//! interruptible: a caller holding an [`Interrupt`] gives up as soon as it
//! is triggered, with no side effects.

use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How often a blocked waiter re-checks its interrupt.
const INTERRUPT_POLL: Duration = Duration::from_millis(5);

/// Cancellation handle for a waiting reclaim call.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

#[derive(Debug, Default)]
pub struct ScanExclusion {
    lock: Mutex<()>,
    in_progress: AtomicBool,
}

/// Held for a whole round. Released on drop, on every exit path.
pub struct ScanGuard<'a> {
    _guard: MutexGuard<'a, ()>,
    in_progress: &'a AtomicBool,
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.in_progress.store(false, Ordering::Release);
    }
}

impl ScanExclusion {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn in_progress(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Block until the exclusion is free, or until `interrupt` fires.
    ///
    /// Returns `None` only when interrupted.
    pub fn acquire(&self, interrupt: Option<&Interrupt>) -> Option<ScanGuard<'_>> {
        let guard = match interrupt {
            None => self.lock.lock(),
            Some(interrupt) => loop {
                if let Some(guard) = self.lock.try_lock() {
                    break guard;
                }
                if interrupt.is_triggered() {
                    return None;
                }
                if let Some(guard) = self.lock.try_lock_for(INTERRUPT_POLL) {
                    break guard;
                }
            },
        };

        self.in_progress.store(true, Ordering::Release);
        Some(ScanGuard {
            _guard: guard,
            in_progress: &self.in_progress,
        })
    }
}
