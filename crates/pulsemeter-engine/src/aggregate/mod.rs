//! Aggregation: the guarded `Metrics` aggregate and its inbound event API.

pub mod aggregator;
pub mod exclusion;
pub mod subscribers;

pub use aggregator::MetricsAggregator;
pub use exclusion::is_technical_endpoint;
pub use subscribers::{MetricsEvent, Subscribers};
