//! Process-wide subscriber initialisation.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text, one line per event.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected 'pretty' or 'json')")),
        }
    }
}

/// Settings for [`init_telemetry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name attached to the startup event.
    pub service_name: String,
    /// Filter directive used when `RUST_LOG` is unset, e.g. `"info"` or `"docqa_rag=debug"`.
    pub default_filter: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { service_name: "docqa".to_string(), default_filter: "info".to_string(), format: LogFormat::Pretty }
    }
}

impl TelemetryConfig {
    /// Create a config for `service_name` with the default filter and format.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into(), ..Self::default() }
    }

    /// Set the fallback filter directive.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }

    /// Set the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),
    /// Another global subscriber was installed outside this crate.
    #[error("global subscriber already set: {0}")]
    AlreadySet(String),
}

/// Install the global subscriber: registry + `EnvFilter` + fmt layer.
///
/// `RUST_LOG` takes precedence over `config.default_filter`. Only the first
/// call installs anything; later calls return `Ok(false)`.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_telemetry::{init_telemetry, LogFormat, TelemetryConfig};
///
/// init_telemetry(&TelemetryConfig::new("docqa").with_format(LogFormat::Json))?;
/// ```
pub fn init_telemetry(config: &TelemetryConfig) -> Result<bool, TelemetryError> {
    if INITIALIZED.get().is_some() {
        return Ok(false);
    }

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.default_filter)
            .map_err(|e| TelemetryError::InvalidFilter(e.to_string()))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json().with_current_span(true)).try_init(),
    };
    installed.map_err(|e| TelemetryError::AlreadySet(e.to_string()))?;

    let _ = INITIALIZED.set(());
    tracing::info!(service.name = %config.service_name, format = ?config.format, "telemetry initialized");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = TelemetryConfig::new("test").with_filter("warn");
        let first = init_telemetry(&config);
        let second = init_telemetry(&config);
        assert!(first.is_ok());
        assert!(!second.unwrap());
    }
}
