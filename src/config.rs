//! # Monitor Configuration
//!
//! This module provides the configuration for a monitoring session. It
//! supports loading from environment variables, validation, and provides
//! a clean interface for accessing settings throughout the crate.

use crate::errors::{MonitorError, MonitorResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Upper bound on a session's wall-clock duration (24 hours)
const MAX_DURATION_CEILING_SECS: f64 = 86_400.0;

/// Monitoring session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Wall-clock bound on the session in seconds; the session
    /// self-terminates once this much time has elapsed
    pub max_duration_secs: f64,
    /// Seconds between resource samples (best-effort cadence)
    pub interval_secs: f64,
    /// Path the session record is saved to by the binary
    pub output_file: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: 600.0, // 10 minutes
            interval_secs: 1.0,
            output_file: "system_performance.json".to_string(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> MonitorResult<Self> {
        let mut config = Self::default();

        config.max_duration_secs = env::var("TRACKING_MAX_DURATION_SECS")
            .unwrap_or_else(|_| "600".to_string())
            .parse()
            .map_err(|_| {
                MonitorError::Config(
                    "TRACKING_MAX_DURATION_SECS must be a valid number of seconds".to_string(),
                )
            })?;
        config.interval_secs = env::var("TRACKING_INTERVAL_SECS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .map_err(|_| {
                MonitorError::Config(
                    "TRACKING_INTERVAL_SECS must be a valid number of seconds".to_string(),
                )
            })?;
        if let Ok(path) = env::var("TRACKING_OUTPUT_FILE") {
            config.output_file = path;
        }

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> MonitorResult<()> {
        // NaN and infinity parse as valid f64 from the environment but
        // would panic later in Duration::from_secs_f64
        if !self.max_duration_secs.is_finite() {
            return Err(MonitorError::Config(
                "Max duration must be a finite number".to_string(),
            ));
        }

        if !self.interval_secs.is_finite() {
            return Err(MonitorError::Config(
                "Sample interval must be a finite number".to_string(),
            ));
        }

        if self.max_duration_secs <= 0.0 {
            return Err(MonitorError::Config(
                "Max duration must be greater than 0".to_string(),
            ));
        }

        if self.max_duration_secs > MAX_DURATION_CEILING_SECS {
            return Err(MonitorError::Config(format!(
                "Max duration cannot be greater than {} seconds",
                MAX_DURATION_CEILING_SECS
            )));
        }

        if self.interval_secs <= 0.0 {
            return Err(MonitorError::Config(
                "Sample interval must be greater than 0".to_string(),
            ));
        }

        if self.interval_secs > self.max_duration_secs {
            return Err(MonitorError::Config(
                "Sample interval cannot be greater than max duration".to_string(),
            ));
        }

        if self.output_file.trim().is_empty() {
            return Err(MonitorError::Config(
                "Output file path cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Session wall-clock bound as a [`Duration`]
    pub fn max_duration(&self) -> Duration {
        Duration::from_secs_f64(self.max_duration_secs)
    }

    /// Sample cadence as a [`Duration`]
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_secs)
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: max_duration_secs={}, interval_secs={}, output_file={}",
            self.max_duration_secs, self.interval_secs, self.output_file
        )
    }
}
