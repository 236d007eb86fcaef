//! # Builder for CmcdConfig
//!
//! Fluent construction of a reporting configuration.
//!
//! # Example
//!
//! ```
//! use cmcd_engine::{CmcdConfig, ReportingMode, TransmissionMode};
//!
//! let config = CmcdConfig::builder()
//!     .with_url("https://collector.example.com/cmcd")
//!     .with_transmission_mode(TransmissionMode::Json)
//!     .with_reporting_mode(ReportingMode::Response)
//!     .with_batch_size(4)
//!     .with_include_keys(["sn", "sta", "ttfb", "ts"])
//!     .build();
//!
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use crate::config::{CmcdConfig, ReportingMode, TransmissionMode};

/// Builder for creating CmcdConfig instances with a fluent API
#[derive(Debug, Clone)]
pub struct CmcdConfigBuilder {
    config: CmcdConfig,
}

impl CmcdConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CmcdConfig::default(),
        }
    }

    /// Start from an existing configuration, e.g. one loaded from a file
    pub fn from_config(config: CmcdConfig) -> Self {
        Self { config }
    }

    /// Set the collector endpoint
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    pub fn with_transmission_mode(mut self, mode: TransmissionMode) -> Self {
        self.config.transmission_mode = mode;
        self
    }

    pub fn with_reporting_mode(mut self, mode: ReportingMode) -> Self {
        self.config.reporting_mode = mode;
        self
    }

    /// Set the number of reports collected before a JSON batch is sent
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Restrict reports to the given CMCD keys
    pub fn with_include_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.include_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Report every key (the default)
    pub fn with_all_keys(mut self) -> Self {
        self.config.include_keys = None;
        self
    }

    /// Set the timer reporting period
    pub fn with_time_interval(mut self, interval: Duration) -> Self {
        self.config.time_interval = Some(interval.as_secs_f64());
        self
    }

    /// Build the CmcdConfig instance
    pub fn build(self) -> CmcdConfig {
        self.config
    }
}

impl Default for CmcdConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = CmcdConfigBuilder::new().build();
        assert_eq!(config, CmcdConfig::default());
    }

    #[test]
    fn test_builder_customization() {
        let config = CmcdConfigBuilder::new()
            .with_url("http://localhost:3000/cmcd")
            .with_transmission_mode(TransmissionMode::Query)
            .with_reporting_mode(ReportingMode::Timer)
            .with_time_interval(Duration::from_millis(2500))
            .with_include_keys(["sn", "e"])
            .build();

        assert_eq!(config.url, "http://localhost:3000/cmcd");
        assert_eq!(config.transmission_mode, TransmissionMode::Query);
        assert_eq!(config.reporting_mode, ReportingMode::Timer);
        assert_eq!(config.time_interval, Some(2.5));
        assert_eq!(config.report_interval(), Some(Duration::from_millis(2500)));
        assert!(config.includes("e"));
        assert!(!config.includes("sta"));

        let config = CmcdConfigBuilder::from_config(config).with_all_keys().build();
        assert!(config.includes("sta"));
    }
}
