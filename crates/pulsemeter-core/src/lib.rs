//! pulsemeter core: the metrics data model, closed event kinds, and errors.
//!
//! This crate defines the shapes shared by the aggregation engine, the
//! exporters, and anything embedding the engine. It carries no runtime or
//! transport dependencies so the model can be serialized and inspected
//! anywhere.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod events;
pub mod model;

/// Shared result type.
pub use error::{MeterError, Result};
pub use events::{BusinessEventKind, SecurityEventKind, WebSocketEventKind};
pub use model::Metrics;
