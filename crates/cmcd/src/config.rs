use std::collections::BTreeSet;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::CmcdError;

const DEFAULT_USER_AGENT: &str = concat!("cmcd-engine/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_BATCH_SIZE: usize = 10;

/// How assembled reports reach the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransmissionMode {
    /// Batched `POST` with a JSON array body.
    #[default]
    Json,
    /// One `GET` per report with the data in the `CMCD` query parameter.
    Query,
}

/// What triggers a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportingMode {
    /// Every completed fragment or manifest load.
    #[default]
    Response,
    /// Media element state transitions.
    Event,
    /// A fixed interval.
    Timer,
}

/// Reporting session configuration. Immutable once the session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CmcdConfig {
    pub transmission_mode: TransmissionMode,
    pub reporting_mode: ReportingMode,
    /// Collector endpoint
    pub url: String,
    /// Reports per JSON batch
    pub batch_size: usize,
    /// Allow-list of CMCD keys; `None` includes every key
    pub include_keys: Option<BTreeSet<String>>,
    /// Timer mode period in seconds, fractions allowed
    pub time_interval: Option<f64>,
}

impl Default for CmcdConfig {
    fn default() -> Self {
        Self {
            transmission_mode: TransmissionMode::default(),
            reporting_mode: ReportingMode::default(),
            url: String::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            include_keys: None,
            time_interval: None,
        }
    }
}

impl CmcdConfig {
    pub fn builder() -> crate::builder::CmcdConfigBuilder {
        crate::builder::CmcdConfigBuilder::new()
    }

    pub fn includes(&self, key: &str) -> bool {
        self.include_keys
            .as_ref()
            .is_none_or(|keys| keys.contains(key))
    }

    pub fn report_interval(&self) -> Option<Duration> {
        self.time_interval
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    pub fn endpoint(&self) -> Result<Url, CmcdError> {
        Ok(Url::parse(&self.url)?)
    }

    pub fn validate(&self) -> Result<(), CmcdError> {
        let endpoint = self.endpoint()?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(CmcdError::ConfigError(format!(
                "collector URL must be http(s), got {}",
                endpoint.scheme()
            )));
        }

        if self.transmission_mode == TransmissionMode::Json && self.batch_size == 0 {
            return Err(CmcdError::ConfigError(
                "batchSize must be at least 1".to_string(),
            ));
        }

        if self.reporting_mode == ReportingMode::Timer && self.report_interval().is_none() {
            return Err(CmcdError::ConfigError(
                "timer reporting requires a positive timeInterval".to_string(),
            ));
        }

        Ok(())
    }
}

/// HTTP client options for talking to the collector
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Overall timeout for a single report request
    pub timeout: Duration,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// User agent string
    pub user_agent: String,

    /// Custom HTTP headers for report requests
    pub headers: HeaderMap,

    /// Whether to use system proxy settings if available
    pub use_system_proxy: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: TransportConfig::get_default_headers(),
            use_system_proxy: true,
        }
    }
}

impl TransportConfig {
    pub fn get_default_headers() -> HeaderMap {
        let mut default_headers = HeaderMap::new();

        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json, text/plain;q=0.9, */*;q=0.8"),
        );

        default_headers.insert(
            reqwest::header::CONNECTION,
            HeaderValue::from_static("keep-alive"),
        );
        default_headers
    }
}
