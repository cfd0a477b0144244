//! Periodic refresh: collaborator contracts, the process probe, and the
//! background scheduler.

pub mod probe;
pub mod providers;
pub mod scheduler;

pub use probe::SysinfoProbe;
pub use providers::{
    BusinessGauges, BusinessMetricsProvider, DatabaseGauges, DatabaseMetricsProvider, ProcessProbe, ProcessSample,
};
pub use scheduler::{RefreshScheduler, SchedulerHandle};
