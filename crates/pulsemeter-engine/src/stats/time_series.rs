//! Bounded, time-retained parallel sample arrays.
//!
//! Every mutation goes through `push` / `pop_oldest`, which touch all arrays
//! together, so the arrays always share one length. Two eviction paths exist:
//! FIFO on capacity overflow (inside `append`) and age-based
//! (`evict_older_than`, driven by the scheduler).

use std::collections::VecDeque;

use pulsemeter_core::model::TimeSeries;

/// 24h at a 30s cadence.
pub const DEFAULT_CAPACITY: usize = 2_880;
pub const DEFAULT_RETENTION_MS: u64 = 24 * 60 * 60 * 1_000;

/// One row across all series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeSeriesSample {
    pub timestamp_ms: u64,
    pub request_rate: f64,
    pub response_time: f64,
    pub error_rate: f64,
    pub memory_usage: f64,
    pub cpu_usage: f64,
}

/// Selects one value series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    RequestRate,
    ResponseTime,
    ErrorRate,
    MemoryUsage,
    CpuUsage,
}

#[derive(Debug, Clone)]
pub struct TimeSeriesBuffer {
    capacity: usize,
    timestamps: VecDeque<u64>,
    request_rates: VecDeque<f64>,
    response_times: VecDeque<f64>,
    error_rates: VecDeque<f64>,
    memory_usage: VecDeque<f64>,
    cpu_usage: VecDeque<f64>,
}

impl Default for TimeSeriesBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl TimeSeriesBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            timestamps: VecDeque::with_capacity(capacity),
            request_rates: VecDeque::with_capacity(capacity),
            response_times: VecDeque::with_capacity(capacity),
            error_rates: VecDeque::with_capacity(capacity),
            memory_usage: VecDeque::with_capacity(capacity),
            cpu_usage: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Append one row, evicting the oldest row when over capacity.
    pub fn append(&mut self, s: TimeSeriesSample) {
        self.push(s);
        while self.len() > self.capacity {
            self.pop_oldest();
        }
    }

    /// Drop every row whose timestamp is older than `cutoff_ms`.
    /// Returns the number of rows removed.
    pub fn evict_older_than(&mut self, cutoff_ms: u64) -> usize {
        let mut removed = 0;
        while matches!(self.timestamps.front(), Some(&ts) if ts < cutoff_ms) {
            self.pop_oldest();
            removed += 1;
        }
        removed
    }

    /// Last `n` values of one series, oldest first.
    pub fn recent(&self, series: Series, n: usize) -> Vec<f64> {
        let src = self.series(series);
        let skip = src.len().saturating_sub(n);
        src.iter().skip(skip).copied().collect()
    }

    pub fn latest(&self) -> Option<TimeSeriesSample> {
        let last = self.len().checked_sub(1)?;
        Some(TimeSeriesSample {
            timestamp_ms: self.timestamps[last],
            request_rate: self.request_rates[last],
            response_time: self.response_times[last],
            error_rate: self.error_rates[last],
            memory_usage: self.memory_usage[last],
            cpu_usage: self.cpu_usage[last],
        })
    }

    pub fn to_series(&self) -> TimeSeries {
        TimeSeries {
            timestamps: self.timestamps.iter().copied().collect(),
            request_rates: self.request_rates.iter().copied().collect(),
            response_times: self.response_times.iter().copied().collect(),
            error_rates: self.error_rates.iter().copied().collect(),
            memory_usage: self.memory_usage.iter().copied().collect(),
            cpu_usage: self.cpu_usage.iter().copied().collect(),
        }
    }

    pub fn clear(&mut self) {
        self.timestamps.clear();
        self.request_rates.clear();
        self.response_times.clear();
        self.error_rates.clear();
        self.memory_usage.clear();
        self.cpu_usage.clear();
    }

    fn series(&self, series: Series) -> &VecDeque<f64> {
        match series {
            Series::RequestRate => &self.request_rates,
            Series::ResponseTime => &self.response_times,
            Series::ErrorRate => &self.error_rates,
            Series::MemoryUsage => &self.memory_usage,
            Series::CpuUsage => &self.cpu_usage,
        }
    }

    fn push(&mut self, s: TimeSeriesSample) {
        self.timestamps.push_back(s.timestamp_ms);
        self.request_rates.push_back(s.request_rate);
        self.response_times.push_back(s.response_time);
        self.error_rates.push_back(s.error_rate);
        self.memory_usage.push_back(s.memory_usage);
        self.cpu_usage.push_back(s.cpu_usage);
    }

    fn pop_oldest(&mut self) {
        self.timestamps.pop_front();
        self.request_rates.pop_front();
        self.response_times.pop_front();
        self.error_rates.pop_front();
        self.memory_usage.pop_front();
        self.cpu_usage.pop_front();
    }
}
