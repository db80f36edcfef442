//! # Session Result Record
//!
//! The owned, mutable accumulation target of a monitoring session and its
//! serialization unit. While a session runs, its background task is the only
//! writer; once the session reaches a terminal state the record is read-only.
//!
//! ## Persisted format
//!
//! One JSON object per session: `resource_logs` maps timestamp keys to
//! per-tick samples, next to the four session-wide scalar fields. Loading is
//! tolerant: fields missing from a well-formed file default to their zero
//! values instead of failing. Unreadable or unparsable files are errors.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{error_logging, MonitorError, MonitorResult};
use crate::sampler::Reading;

/// Timestamp keys carry millisecond precision so sub-second sampling does
/// not silently overwrite log entries. Zero-padded fields keep lexicographic
/// order equal to chronological order.
const TIMESTAMP_KEY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// A point-in-time resource reading as stored in the log
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSample {
    /// Resident memory of the monitored process in MiB
    pub current_memory: f64,
    /// System-wide CPU utilization as a percentage of one core
    pub current_cpu_percent: f64,
    /// The same utilization expressed in fractional cores
    pub current_cpu_usage: f64,
    /// Logical core count at the time of the reading
    pub total_cpus: usize,
}

/// Aggregated result of one monitoring session
///
/// Invariants held across a session:
/// - `peak_memory_global` >= every `current_memory` in `resource_logs`
/// - `peak_cpu_global` >= every `current_cpu_usage` in `resource_logs`
/// - `total_cpus` is captured once at session start and never changes
/// - `resource_logs` only grows until the session ends
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceResult {
    /// Chronologically ordered log of per-tick samples, keyed by timestamp
    pub resource_logs: BTreeMap<String, ResourceSample>,
    /// Running maximum of `current_memory` across all samples (MiB)
    pub peak_memory_global: f64,
    /// Running maximum of `current_cpu_usage` across all samples (cores)
    pub peak_cpu_global: f64,
    /// Logical core count of the host
    pub total_cpus: usize,
    /// Elapsed wall-clock seconds since session start
    pub total_time: f64,
}

impl PerformanceResult {
    /// Create an empty record for a session on a host with `total_cpus` cores
    pub fn new(total_cpus: usize) -> Self {
        Self {
            total_cpus,
            ..Self::default()
        }
    }

    /// Format a wall-clock timestamp into a log key
    pub fn timestamp_key(timestamp: DateTime<Local>) -> String {
        timestamp.format(TIMESTAMP_KEY_FORMAT).to_string()
    }

    /// Fold one raw reading into the record: updates both global peaks and
    /// appends a log entry keyed by `timestamp`. Returns the stored sample.
    pub fn record_sample(&mut self, timestamp: DateTime<Local>, reading: &Reading) -> ResourceSample {
        let current_cpu_usage = (reading.cpu_percent / 100.0) * self.total_cpus as f64;

        self.peak_memory_global = self.peak_memory_global.max(reading.memory_mib);
        self.peak_cpu_global = self.peak_cpu_global.max(current_cpu_usage);

        let sample = ResourceSample {
            current_memory: reading.memory_mib,
            current_cpu_percent: reading.cpu_percent,
            current_cpu_usage,
            total_cpus: self.total_cpus,
        };

        let key = self.unique_key(Self::timestamp_key(timestamp));
        self.resource_logs.insert(key, sample);
        sample
    }

    /// Disambiguate key collisions at identical milliseconds with a
    /// zero-padded `#n` suffix so the log never silently overwrites an
    /// entry and suffixed keys still sort chronologically
    fn unique_key(&self, base: String) -> String {
        if !self.resource_logs.contains_key(&base) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}#{:04}", base, n);
            if !self.resource_logs.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Save the record as pretty-printed JSON
    pub fn save_json(&self, path: impl AsRef<Path>) -> MonitorResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| {
            error_logging::log_io_error(&e, "save_json", &path.display().to_string());
            MonitorError::Io(format!("cannot write {}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), samples = self.resource_logs.len(), "System performance data saved");
        Ok(())
    }

    /// Load a record saved by [`save_json`](Self::save_json)
    ///
    /// Missing fields default to zero values (tolerant read). An unreadable
    /// file is [`MonitorError::Io`]; malformed JSON is
    /// [`MonitorError::Serialization`].
    pub fn load_json(path: impl AsRef<Path>) -> MonitorResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            error_logging::log_io_error(&e, "load_json", &path.display().to_string());
            MonitorError::Io(format!("cannot read {}: {}", path.display(), e))
        })?;
        let result = serde_json::from_str(&contents).map_err(|e| {
            error_logging::log_io_error(&e, "load_json", &path.display().to_string());
            MonitorError::Serialization(format!("cannot parse {}: {}", path.display(), e))
        })?;
        Ok(result)
    }
}

/// Load a saved record as a raw JSON value, without imposing the record's
/// schema. Follows the same error policy as [`PerformanceResult::load_json`].
pub fn load_json_value(path: impl AsRef<Path>) -> MonitorResult<serde_json::Value> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        error_logging::log_io_error(&e, "load_json_value", &path.display().to_string());
        MonitorError::Io(format!("cannot read {}: {}", path.display(), e))
    })?;
    let value = serde_json::from_str(&contents).map_err(|e| {
        error_logging::log_io_error(&e, "load_json_value", &path.display().to_string());
        MonitorError::Serialization(format!("cannot parse {}: {}", path.display(), e))
    })?;
    Ok(value)
}
