// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::time::{Duration, Instant};

/// Counts escalating samples and trips once per burst.
///
/// A burst starts with the first sample and ends after `window` without
/// any sample; the next sample after that starts a fresh count. The
/// detector reports at most once per burst, on the `threshold`-th sample.
#[derive(Debug, Clone)]
pub struct RateWindow {
    threshold: u32,
    window: Duration,
    count: u32,
    last_sample: Option<Instant>,
    reported: bool,
}

impl RateWindow {
    pub fn new(threshold: u32, window: Duration) -> Self {
        Self {
            threshold,
            window,
            count: 0,
            last_sample: None,
            reported: false,
        }
    }

    /// Change limits without losing the current count.
    pub fn retune(&mut self, threshold: u32, window: Duration) {
        self.threshold = threshold;
        self.window = window;
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Record a sample at `now`. Returns the count when the threshold is
    /// crossed for the first time in this burst.
    pub fn observe(&mut self, now: Instant) -> Option<u32> {
        if let Some(last) = self.last_sample {
            if now.saturating_duration_since(last) >= self.window {
                self.count = 0;
                self.reported = false;
            }
        }

        self.last_sample = Some(now);
        self.count = self.count.saturating_add(1);

        if self.threshold > 0 && !self.reported && self.count >= self.threshold {
            self.reported = true;
            return Some(self.count);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trips_once_per_burst() {
        let mut window = RateWindow::new(20, Duration::from_secs(30));
        let start = Instant::now();

        let trips: Vec<_> = (0..25)
            .filter_map(|i| window.observe(start + Duration::from_secs(i)))
            .collect();

        assert_eq!(trips, vec![20]);
        assert_eq!(window.count(), 25);
    }

    #[test]
    fn test_resets_after_inactivity() {
        let mut window = RateWindow::new(3, Duration::from_secs(30));
        let start = Instant::now();

        assert_eq!(window.observe(start), None);
        assert_eq!(window.observe(start + Duration::from_secs(1)), None);
        assert_eq!(window.observe(start + Duration::from_secs(2)), Some(3));

        // quiet for a full window
        let later = start + Duration::from_secs(32);
        assert_eq!(window.observe(later), None);
        assert_eq!(window.count(), 1);
        assert_eq!(window.observe(later + Duration::from_secs(1)), None);
        assert_eq!(window.observe(later + Duration::from_secs(2)), Some(3));
    }

    #[test]
    fn test_zero_threshold_never_trips() {
        let mut window = RateWindow::new(0, Duration::from_secs(30));
        let now = Instant::now();
        for _ in 0..100 {
            assert_eq!(window.observe(now), None);
        }
    }
}
