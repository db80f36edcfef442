//! # system-tracking
//!
//! Background host-resource monitor: samples the current process's memory
//! and system-wide CPU on a fixed cadence, folds each reading into running
//! peak statistics and an ordered log, and persists the session record as
//! JSON for later report rendering.

pub mod config;
pub mod errors;
pub mod monitor;
pub mod report;
pub mod result;
pub mod sampler;
pub mod table;

// Re-export types for easier access
pub use config::MonitorConfig;
pub use errors::{MonitorError, MonitorResult};
pub use monitor::{MonitorSession, ResourceMonitor, SessionState};
pub use result::{load_json_value, PerformanceResult, ResourceSample};
pub use sampler::{Reading, ResourceSampler, SystemSampler};
