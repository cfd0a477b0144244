//! Snapshot exporters.
//!
//! Both take an already-copied `Metrics`, so rendering never blocks writers.

pub mod json;
pub mod prometheus;
