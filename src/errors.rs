//! # Application Error Types
//!
//! This module defines the error types used throughout the system-tracking
//! crate. Every fallible operation returns [`MonitorResult`], and no error is
//! fatal to the host process: the monitor is a non-critical side activity.

use std::fmt;

/// General monitor error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorError {
    /// Configuration validation errors
    Config(String),
    /// File system errors during save/load
    Io(String),
    /// JSON encode/decode errors
    Serialization(String),
    /// A session was started while another one is still running
    SessionAlreadyActive,
    /// Transient failure reading a resource sample (tick is skipped)
    SampleRead(String),
    /// Internal errors (task join failures, panics in the sampling loop)
    Internal(String),
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            MonitorError::Io(msg) => write!(f, "[IO] {}", msg),
            MonitorError::Serialization(msg) => write!(f, "[SERIALIZATION] {}", msg),
            MonitorError::SessionAlreadyActive => {
                write!(f, "[SESSION] a monitoring session is already active")
            }
            MonitorError::SampleRead(msg) => write!(f, "[SAMPLE] {}", msg),
            MonitorError::Internal(msg) => write!(f, "[INTERNAL] {}", msg),
        }
    }
}

impl std::error::Error for MonitorError {}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        MonitorError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for MonitorError {
    fn from(err: anyhow::Error) -> Self {
        MonitorError::Internal(err.to_string())
    }
}

/// Result type alias for convenience
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Standardized error logging utilities for consistent error reporting
pub mod error_logging {
    use tracing::{error, warn};

    /// Log save/load failures with path context
    pub fn log_io_error(error: &impl std::fmt::Display, operation: &str, path: &str) {
        error!(
            error = %error,
            operation = %operation,
            path = %path,
            "File operation failed"
        );
    }

    /// Log a transient sample-read failure; the tick is skipped, not fatal
    pub fn log_sample_error(error: &impl std::fmt::Display, tick: u64) {
        warn!(
            error = %error,
            tick = %tick,
            "Resource sample read failed, skipping tick"
        );
    }

    /// Log a fault that terminated the sampling loop; the session ends with
    /// the data collected so far, the host process is unaffected
    pub fn log_monitor_fault(error: &impl std::fmt::Display, context: &str) {
        error!(
            error = %error,
            context = %context,
            "Monitoring loop fault, session terminated"
        );
    }

    /// Log configuration errors during startup
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            "Configuration error"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_tags() {
        assert_eq!(
            MonitorError::Config("bad interval".to_string()).to_string(),
            "[CONFIG] bad interval"
        );
        assert_eq!(
            MonitorError::SessionAlreadyActive.to_string(),
            "[SESSION] a monitoring session is already active"
        );
        assert!(MonitorError::SampleRead("gone".to_string())
            .to_string()
            .starts_with("[SAMPLE]"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: MonitorError = io.into();
        assert!(matches!(err, MonitorError::Io(_)));
    }

    #[test]
    fn test_serde_error_conversion() {
        let bad = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: MonitorError = bad.into();
        assert!(matches!(err, MonitorError::Serialization(_)));
    }
}
