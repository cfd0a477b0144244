use serde::Deserialize;
use pulsemeter_core::error::{MeterError, Result};

use crate::stats::{rate_window, sampler, time_series};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeterConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub scheduler: SchedulerSection,
}

impl MeterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MeterError::UnsupportedVersion);
        }
        self.engine.validate()?;
        self.scheduler.validate()?;
        Ok(())
    }
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            engine: EngineSection::default(),
            scheduler: SchedulerSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { listen: default_listen() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    #[serde(default = "default_rate_window_ms")]
    pub rate_window_ms: u64,

    #[serde(default = "default_sample_capacity")]
    pub sample_capacity: usize,

    #[serde(default = "default_time_series_capacity")]
    pub time_series_capacity: usize,

    #[serde(default = "default_time_series_retention_ms")]
    pub time_series_retention_ms: u64,

    #[serde(default = "default_trend_points")]
    pub trend_points: usize,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            rate_window_ms: default_rate_window_ms(),
            sample_capacity: default_sample_capacity(),
            time_series_capacity: default_time_series_capacity(),
            time_series_retention_ms: default_time_series_retention_ms(),
            trend_points: default_trend_points(),
        }
    }
}

impl EngineSection {
    pub fn validate(&self) -> Result<()> {
        if !(1_000..=3_600_000).contains(&self.rate_window_ms) {
            return Err(MeterError::BadConfig(
                "engine.rate_window_ms must be between 1000 and 3600000".into(),
            ));
        }
        if !(1..=10_000).contains(&self.sample_capacity) {
            return Err(MeterError::BadConfig(
                "engine.sample_capacity must be between 1 and 10000".into(),
            ));
        }
        if !(1..=100_000).contains(&self.time_series_capacity) {
            return Err(MeterError::BadConfig(
                "engine.time_series_capacity must be between 1 and 100000".into(),
            ));
        }
        if self.time_series_retention_ms < 60_000 {
            return Err(MeterError::BadConfig(
                "engine.time_series_retention_ms must be at least 60000".into(),
            ));
        }
        if !(10..=1_000).contains(&self.trend_points) {
            return Err(MeterError::BadConfig(
                "engine.trend_points must be between 10 and 1000".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerSection {
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    #[serde(default = "default_eviction_interval_ms")]
    pub eviction_interval_ms: u64,

    #[serde(default = "default_audit_interval_ms")]
    pub audit_interval_ms: u64,

    #[serde(default = "default_collaborator_timeout_ms")]
    pub collaborator_timeout_ms: u64,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
            eviction_interval_ms: default_eviction_interval_ms(),
            audit_interval_ms: default_audit_interval_ms(),
            collaborator_timeout_ms: default_collaborator_timeout_ms(),
        }
    }
}

impl SchedulerSection {
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("scheduler.refresh_interval_ms", self.refresh_interval_ms),
            ("scheduler.eviction_interval_ms", self.eviction_interval_ms),
            ("scheduler.audit_interval_ms", self.audit_interval_ms),
        ] {
            if v < 10 {
                return Err(MeterError::BadConfig(format!("{name} must be at least 10")));
            }
        }
        if self.collaborator_timeout_ms == 0 {
            return Err(MeterError::BadConfig(
                "scheduler.collaborator_timeout_ms must be greater than 0".into(),
            ));
        }
        // A collaborator call must finish before the next refresh starts.
        if self.collaborator_timeout_ms >= self.refresh_interval_ms {
            return Err(MeterError::BadConfig(
                "scheduler.collaborator_timeout_ms must be less than refresh_interval_ms".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:9464".into()
}
fn default_rate_window_ms() -> u64 {
    rate_window::DEFAULT_WINDOW_MS
}
fn default_sample_capacity() -> usize {
    sampler::DEFAULT_SAMPLE_CAPACITY
}
fn default_time_series_capacity() -> usize {
    time_series::DEFAULT_CAPACITY
}
fn default_time_series_retention_ms() -> u64 {
    time_series::DEFAULT_RETENTION_MS
}
fn default_trend_points() -> usize {
    10
}
fn default_refresh_interval_ms() -> u64 {
    30_000
}
fn default_eviction_interval_ms() -> u64 {
    60_000
}
fn default_audit_interval_ms() -> u64 {
    3_600_000
}
fn default_collaborator_timeout_ms() -> u64 {
    5_000
}
