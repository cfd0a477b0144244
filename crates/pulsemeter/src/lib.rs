//! Top-level facade crate for pulsemeter.
//!
//! Re-exports the core model and the engine so users can depend on a single crate.

pub mod core {
    pub use pulsemeter_core::*;
}

pub mod engine {
    pub use pulsemeter_engine::*;
}
