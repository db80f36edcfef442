//! # Report Adapter
//!
//! Boundary adapter between session records and an external report
//! generator. Mirrors the plugin contract's two operations: `compute`
//! reshapes flattened rows into per-session summaries plus per-session log
//! tables, and `render_text_widgets` turns the summaries into the counter
//! lines a report widget displays. Chart rendering itself belongs to the
//! reporting framework and is not handled here.

use std::collections::BTreeMap;

use crate::table::ResourceLogRow;

/// Name assigned to rows that were flattened without a session name
const DEFAULT_SESSION_NAME: &str = "default";

/// Scalar summary of one session as shown in report counters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceSummary {
    pub total_cpus: usize,
    pub peak_cpu_global: f64,
    pub peak_memory_global: f64,
    pub total_time: f64,
}

/// One time-series point of a session's log table, scalar columns stripped
#[derive(Debug, Clone, PartialEq)]
pub struct LogPoint {
    pub timestamp: String,
    pub current_memory: f64,
    pub current_cpu_percent: f64,
    pub current_cpu_usage: f64,
}

/// Computed report input: per-session summaries and log tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceReport {
    pub summaries: BTreeMap<String, PerformanceSummary>,
    pub log_tables: BTreeMap<String, Vec<LogPoint>>,
}

impl PerformanceReport {
    /// Split a (possibly concatenated) row set by session name and extract
    /// each session's scalar summary and time-series table
    pub fn compute(rows: &[ResourceLogRow]) -> Self {
        let mut report = Self::default();

        for row in rows {
            let name = row
                .name
                .clone()
                .unwrap_or_else(|| DEFAULT_SESSION_NAME.to_string());

            // Scalars are broadcast onto every row of a session, so the
            // first row seen fixes the summary
            report.summaries.entry(name.clone()).or_insert(PerformanceSummary {
                total_cpus: row.total_cpus,
                peak_cpu_global: row.peak_cpu_global,
                peak_memory_global: row.peak_memory_global,
                total_time: row.total_time,
            });

            report.log_tables.entry(name).or_default().push(LogPoint {
                timestamp: row.timestamp.clone(),
                current_memory: row.current_memory,
                current_cpu_percent: row.current_cpu_percent,
                current_cpu_usage: row.current_cpu_usage,
            });
        }

        report
    }

    /// Render the report as plain text widget lines, one block per session
    pub fn render_text_widgets(&self) -> Vec<String> {
        let mut widgets = Vec::new();
        for (name, summary) in &self.summaries {
            widgets.push(format!("System Performance for {}", name));
            widgets.push(format!("Total CPU: {}", summary.total_cpus));
            widgets.push(format!(
                "Peak CPU Usage: {:.2}/{}",
                summary.peak_cpu_global, summary.total_cpus
            ));
            widgets.push(format!(
                "Peak Memory Usage (MB): {:.2}",
                summary.peak_memory_global
            ));
            widgets.push(format!(
                "Total Execute Time (Minute): {:.2}",
                summary.total_time / 60.0
            ));
        }
        widgets
    }
}
