//! pulsemeter engine library entry.
//!
//! This crate wires the leaf statistics, the aggregator, the background refresh
//! scheduler, the exporters and the operational HTTP routes into one in-process
//! metrics engine. It is intended to be consumed by the binary (`main.rs`),
//! by host applications embedding the aggregator, and by integration tests.

pub mod aggregate;
pub mod app_state;
pub mod clock;
pub mod config;
pub mod export;
pub mod ops;
pub mod refresh;
pub mod router;
pub mod stats;
