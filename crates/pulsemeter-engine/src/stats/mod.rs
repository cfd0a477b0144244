//! Leaf statistics used by the aggregator.
//!
//! None of these types lock; the aggregator owns them behind its single mutex.

pub mod rate_window;
pub mod sampler;
pub mod time_series;
pub mod trend;

pub use rate_window::{RateUnit, RateWindowTracker};
pub use sampler::ResponseTimeSampler;
pub use time_series::{Series, TimeSeriesBuffer, TimeSeriesSample};
pub use trend::slope;
