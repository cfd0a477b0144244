//! Process resource sampling backed by `sysinfo`.

use std::time::Instant;

use sysinfo::{Pid, System};

use pulsemeter_core::error::{MeterError, Result};

use super::providers::{ProcessProbe, ProcessSample};

pub struct SysinfoProbe {
    sys: System,
    pid: Pid,
    last: Option<Instant>,
}

impl SysinfoProbe {
    pub fn new() -> Result<Self> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| MeterError::Internal(format!("current pid unavailable: {e}")))?;
        Ok(Self {
            sys: System::new(),
            pid,
            last: None,
        })
    }
}

impl ProcessProbe for SysinfoProbe {
    fn sample(&mut self) -> Result<ProcessSample> {
        let now = Instant::now();
        if !self.sys.refresh_process(self.pid) {
            return Err(MeterError::Internal("process refresh failed".into()));
        }
        let proc_ = self
            .sys
            .process(self.pid)
            .ok_or_else(|| MeterError::Internal("current process not found".into()))?;

        // cpu_usage() is a percentage of one core since the previous refresh.
        let cpu_seconds = match self.last {
            Some(prev) => f64::from(proc_.cpu_usage()) / 100.0 * now.duration_since(prev).as_secs_f64(),
            None => 0.0,
        };
        self.last = Some(now);

        Ok(ProcessSample {
            memory_bytes: proc_.memory(),
            cpu_seconds,
        })
    }
}
