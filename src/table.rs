//! # Tabular Conversion
//!
//! Flattens a [`PerformanceResult`] into plain rows for downstream tabular
//! consumers: one row per log entry, with the four session-wide scalar
//! fields broadcast onto every row. [`concat_named`] merges several named
//! sessions into one row set tagged by a `name` column, the shape the
//! reporting side consumes when comparing sessions.

use serde::Serialize;

use crate::result::PerformanceResult;

/// One flattened log entry with its session's scalar fields broadcast on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceLogRow {
    /// Session name; `None` for rows flattened from a single session
    pub name: Option<String>,
    /// Log key of the entry (timestamp string)
    pub timestamp: String,
    pub current_memory: f64,
    pub current_cpu_percent: f64,
    pub current_cpu_usage: f64,
    pub total_cpus: usize,
    pub peak_memory_global: f64,
    pub peak_cpu_global: f64,
    pub total_time: f64,
}

/// Flatten one session record into rows, in chronological order
pub fn to_rows(result: &PerformanceResult) -> Vec<ResourceLogRow> {
    named_rows(None, result)
}

/// Merge named session records into a single row set
///
/// Every row carries the name of the session it came from, so a mixed row
/// set can later be split back per session for comparison.
pub fn concat_named<'a, I>(sessions: I) -> Vec<ResourceLogRow>
where
    I: IntoIterator<Item = (&'a str, &'a PerformanceResult)>,
{
    sessions
        .into_iter()
        .flat_map(|(name, result)| named_rows(Some(name.to_string()), result))
        .collect()
}

fn named_rows(name: Option<String>, result: &PerformanceResult) -> Vec<ResourceLogRow> {
    result
        .resource_logs
        .iter()
        .map(|(timestamp, sample)| ResourceLogRow {
            name: name.clone(),
            timestamp: timestamp.clone(),
            current_memory: sample.current_memory,
            current_cpu_percent: sample.current_cpu_percent,
            current_cpu_usage: sample.current_cpu_usage,
            total_cpus: result.total_cpus,
            peak_memory_global: result.peak_memory_global,
            peak_cpu_global: result.peak_cpu_global,
            total_time: result.total_time,
        })
        .collect()
}
