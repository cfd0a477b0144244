//! Sliding-window event rate.
//!
//! Entries are `(timestamp_ms, count)` in time order. Events landing in the same
//! millisecond share one entry, and a running sum of everything still inside
//! the configured window is kept, so `add` + `current_rate` cost O(1) amortized:
//! pruning only ever pops the expired prefix.

use std::collections::VecDeque;

/// Default window for request/error rates.
pub const DEFAULT_WINDOW_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateUnit {
    PerSecond,
    PerMinute,
}

impl RateUnit {
    /// Number of units in `window_ms`.
    fn units_in(self, window_ms: u64) -> f64 {
        match self {
            RateUnit::PerSecond => window_ms as f64 / 1_000.0,
            RateUnit::PerMinute => window_ms as f64 / 60_000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateWindowTracker {
    window_ms: u64,
    entries: VecDeque<(u64, u64)>,
    in_window: u64,
}

impl Default for RateWindowTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_MS)
    }
}

impl RateWindowTracker {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms: window_ms.max(1),
            entries: VecDeque::new(),
            in_window: 0,
        }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Register one event at `now_ms`, then drop entries older than the window.
    pub fn add(&mut self, now_ms: u64) {
        match self.entries.back_mut() {
            // Same millisecond, or a clock that stepped backwards: fold into the
            // newest entry so the sequence stays time-ordered.
            Some((ts, count)) if *ts >= now_ms => *count += 1,
            _ => self.entries.push_back((now_ms, 1)),
        }
        self.in_window += 1;
        self.prune(now_ms);
    }

    /// Prefix trim of entries whose age exceeds the window.
    pub fn prune(&mut self, now_ms: u64) {
        while let Some(&(ts, count)) = self.entries.front() {
            if now_ms.saturating_sub(ts) <= self.window_ms {
                break;
            }
            self.entries.pop_front();
            self.in_window -= count;
        }
    }

    /// Rate over the configured window. O(1) amortized.
    pub fn current_rate(&mut self, now_ms: u64, unit: RateUnit) -> f64 {
        self.prune(now_ms);
        if self.in_window == 0 {
            return 0.0;
        }
        self.in_window as f64 / unit.units_in(self.window_ms)
    }

    /// Rate over an arbitrary window ending at `now_ms`.
    ///
    /// Windows longer than the configured one only see what has not been pruned.
    pub fn rate(&self, now_ms: u64, window_ms: u64, unit: RateUnit) -> f64 {
        if window_ms == 0 {
            return 0.0;
        }
        let count: u64 = self
            .entries
            .iter()
            .rev()
            .take_while(|(ts, _)| now_ms.saturating_sub(*ts) <= window_ms)
            .map(|(_, c)| *c)
            .sum();
        if count == 0 {
            return 0.0;
        }
        count as f64 / unit.units_in(window_ms)
    }

    /// Events currently inside the configured window (as of the last prune).
    pub fn len(&self) -> u64 {
        self.in_window
    }

    pub fn is_empty(&self) -> bool {
        self.in_window == 0
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.in_window = 0;
    }
}
