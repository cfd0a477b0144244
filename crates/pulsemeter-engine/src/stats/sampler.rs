//! Bounded response-time samples and percentile lookup.
//!
//! Percentiles copy and sort the buffer on every call. That is fine at the
//! default capacity of 100; a streaming quantile sketch would be needed for much
//! larger sample counts.

use pulsemeter_core::model::ResponseTimeHistogram;

pub const DEFAULT_SAMPLE_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct ResponseTimeSampler {
    samples: Vec<f64>,
    capacity: usize,
    /// Slot overwritten by the next sample once full.
    next: usize,
}

impl Default for ResponseTimeSampler {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_CAPACITY)
    }
}

impl ResponseTimeSampler {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            next: 0,
        }
    }

    pub fn add(&mut self, ms: f64) {
        if self.samples.len() < self.capacity {
            self.samples.push(ms);
        } else {
            self.samples[self.next] = ms;
        }
        self.next = (self.next + 1) % self.capacity;
    }

    /// Value at index `floor(n * p)` of the sorted samples; 0 when empty.
    pub fn percentile(&self, p: f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mut sorted = self.samples.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        let idx = (n as f64 * p.clamp(0.0, 1.0)).floor() as usize;
        sorted[idx.min(n - 1)]
    }

    pub fn histogram(&self) -> ResponseTimeHistogram {
        ResponseTimeHistogram {
            p50: self.percentile(0.50),
            p90: self.percentile(0.90),
            p95: self.percentile(0.95),
            p99: self.percentile(0.99),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.next = 0;
    }
}
