use std::path::Path;
use std::time::Duration;

use cmcd_engine::{CmcdConfig, CmcdConfigBuilder, ReportingMode, TransmissionMode, TransportConfig};
use tracing::info;

use crate::cli::CliArgs;
use crate::error::AppError;
use crate::utils::{merge_headers, parse_time};

/// Loads CMCD options from a JSON file
pub fn load_config_file(path: &Path) -> Result<CmcdConfig, AppError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw)
        .map_err(|e| AppError::ParseError(format!("{}: {e}", path.display())))
}

/// Resolves the reporting configuration: file values first, flags on top
pub fn resolve_cmcd_config(args: &CliArgs) -> Result<CmcdConfig, AppError> {
    let base = match &args.config {
        Some(path) => {
            info!("Loading CMCD configuration from {}", path.display());
            load_config_file(path)?
        }
        None => CmcdConfig::default(),
    };

    let mut builder = CmcdConfigBuilder::from_config(base);

    if let Some(url) = &args.url {
        builder = builder.with_url(url);
    }

    if let Some(mode) = &args.transmission_mode {
        builder = builder.with_transmission_mode(match mode.as_str() {
            "json" => TransmissionMode::Json,
            "query" => TransmissionMode::Query,
            other => {
                return Err(AppError::InvalidInput(format!(
                    "unknown transmission mode '{other}'"
                )));
            }
        });
    }

    if let Some(mode) = &args.reporting_mode {
        builder = builder.with_reporting_mode(match mode.as_str() {
            "response" => ReportingMode::Response,
            "event" => ReportingMode::Event,
            "timer" => ReportingMode::Timer,
            other => {
                return Err(AppError::InvalidInput(format!(
                    "unknown reporting mode '{other}'"
                )));
            }
        });
    }

    if let Some(batch_size) = args.batch_size {
        builder = builder.with_batch_size(batch_size);
    }

    if let Some(keys) = &args.include_keys {
        builder = builder.with_include_keys(keys.iter().map(|k| k.trim().to_string()));
    }

    if let Some(interval) = &args.time_interval {
        builder = builder.with_time_interval(parse_time(interval)?);
    }

    let config = builder.build();
    config.validate()?;
    Ok(config)
}

/// HTTP client options for the collector
pub fn resolve_transport_config(args: &CliArgs) -> TransportConfig {
    let mut config = TransportConfig {
        timeout: Duration::from_secs(args.timeout),
        connect_timeout: Duration::from_secs(args.connect_timeout),
        use_system_proxy: !args.no_proxy,
        ..Default::default()
    };
    merge_headers(&mut config.headers, &args.headers);
    config
}
