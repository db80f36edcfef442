//! # Resource Samplers
//!
//! This module provides the point-in-time resource readers feeding the
//! sampling loop. The [`ResourceSampler`] trait is the seam between the loop
//! and the underlying sensor, so aggregation logic can be exercised against
//! scripted readings in tests while production uses [`SystemSampler`].

use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::errors::{MonitorError, MonitorResult};

/// One raw resource reading taken at a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Resident memory of the current process in MiB
    pub memory_mib: f64,
    /// System-wide CPU utilization as a percentage of one core
    pub cpu_percent: f64,
}

/// Source of resource readings for the sampling loop
///
/// A failed read is a transient fault ([`MonitorError::SampleRead`]): the
/// loop logs it and skips the tick, it never folds a failed reading into
/// the running peaks.
pub trait ResourceSampler: Send {
    /// Logical core count, captured once at session start
    fn total_cpus(&self) -> usize;

    /// Take one reading of process memory and system CPU
    fn sample(&mut self) -> MonitorResult<Reading>;
}

/// Production sampler backed by `sysinfo`
///
/// The CPU figure is an instantaneous measurement relative to the previous
/// refresh, not an average over the sampling interval: the first tick after
/// start can legitimately read 0.0 until a second refresh has happened.
pub struct SystemSampler {
    system: System,
    pid: Pid,
}

impl SystemSampler {
    /// Create a sampler for the current process
    pub fn new() -> MonitorResult<Self> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| MonitorError::SampleRead(format!("cannot resolve current pid: {}", e)))?;
        let mut system = System::new();
        // Populates the CPU list so total_cpus() is available before the first tick
        system.refresh_cpu_all();
        Ok(Self { system, pid })
    }
}

impl ResourceSampler for SystemSampler {
    fn total_cpus(&self) -> usize {
        self.system.cpus().len()
    }

    fn sample(&mut self) -> MonitorResult<Reading> {
        self.system.refresh_cpu_all();
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);

        let process = self.system.process(self.pid).ok_or_else(|| {
            MonitorError::SampleRead(format!("process {} not found", self.pid))
        })?;

        let memory_mib = process.memory() as f64 / (1024.0 * 1024.0);
        let cpu_percent = f64::from(self.system.global_cpu_usage());

        Ok(Reading {
            memory_mib,
            cpu_percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_sampler_reports_cpus() {
        let sampler = SystemSampler::new().unwrap();
        assert!(sampler.total_cpus() > 0);
    }

    #[test]
    fn test_system_sampler_reads_current_process() {
        let mut sampler = SystemSampler::new().unwrap();
        let reading = sampler.sample().unwrap();

        // A running test binary always has resident memory
        assert!(reading.memory_mib > 0.0);
        assert!(reading.cpu_percent >= 0.0);
    }
}
