//! Monitor configuration.

use std::time::Duration;

use derive_builder::Builder;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::MonitorError;

/// Configuration for the directory monitor and scheduler.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct MonitorConfig {
    /// Period of the fallback scan (and the scheduler tick).
    #[builder(default = "Duration::from_secs(5)")]
    #[serde(default = "default_scan_period")]
    pub scan_period: Duration,

    /// Debounce window for settling events; defaults to the scan period.
    #[builder(default)]
    #[serde(default)]
    pub debounce_window: Option<Duration>,

    /// Capacity of each folder's work queue.
    #[builder(default = "64")]
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// File-name globs the monitor never dispatches (in-progress files,
    /// hidden files).
    #[builder(default = "default_ignore_patterns()")]
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
}

fn default_scan_period() -> Duration {
    Duration::from_secs(5)
}

fn default_queue_capacity() -> usize {
    64
}

/// File names that are still being produced by another program.
pub fn default_ignore_patterns() -> Vec<String> {
    [".*", "*.tmp", "*.part", "*.crdownload", "*.download"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl MonitorConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(period) = &self.scan_period {
            if period.is_zero() {
                return Err("Scan period cannot be zero".to_string());
            }
        }
        if let Some(capacity) = &self.queue_capacity {
            if *capacity == 0 {
                return Err("Queue capacity cannot be zero".to_string());
            }
        }
        Ok(())
    }
}

impl MonitorConfig {
    /// Create a new monitor config builder.
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::default()
    }

    /// The effective debounce window.
    pub fn debounce(&self) -> Duration {
        self.debounce_window.unwrap_or(self.scan_period)
    }

    /// Compile the ignore patterns into a matcher.
    pub(crate) fn ignore_set(&self) -> Result<GlobSet, MonitorError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.ignore_patterns {
            builder.add(Glob::new(pattern)?);
        }
        Ok(builder.build()?)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            scan_period: default_scan_period(),
            debounce_window: None,
            queue_capacity: default_queue_capacity(),
            ignore_patterns: default_ignore_patterns(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = MonitorConfig::builder()
            .scan_period(Duration::from_secs(2))
            .queue_capacity(16usize)
            .build()
            .unwrap();

        assert_eq!(config.scan_period, Duration::from_secs(2));
        assert_eq!(config.queue_capacity, 16);
        // Debounce follows the scan period unless set.
        assert_eq!(config.debounce(), Duration::from_secs(2));
    }

    #[test]
    fn test_explicit_debounce_window() {
        let config = MonitorConfig::builder()
            .debounce_window(Some(Duration::from_millis(200)))
            .build()
            .unwrap();
        assert_eq!(config.debounce(), Duration::from_millis(200));
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(
            MonitorConfig::builder()
                .scan_period(Duration::ZERO)
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_default_ignores_match_in_progress_files() {
        let config = MonitorConfig::default();
        let set = config.ignore_set().unwrap();
        assert!(set.is_match("download.crdownload"));
        assert!(set.is_match(".hidden"));
        assert!(set.is_match("upload.part"));
        assert!(!set.is_match("report.pdf"));
    }
}
