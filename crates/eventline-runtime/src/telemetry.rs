//! Tracing subscriber setup driven by environment variables.

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::EnvFilter;

/// Selects the log output format.
pub const LOG_FORMAT_VAR: &str = "EVENTLINE_LOG_FORMAT";

/// Standard tracing filter directive variable.
pub const FILTER_VAR: &str = "RUST_LOG";

const DEFAULT_FILTER: &str = "info";

/// Errors raised while configuring tracing.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The log format variable holds an unknown value.
    #[error("unknown log format: {0} (expected json or pretty)")]
    UnknownFormat(String),

    /// The filter directive could not be parsed.
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),

    /// A global subscriber is already installed.
    #[error("tracing already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(TelemetryError::UnknownFormat(other.to_owned())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Pretty => f.write_str("pretty"),
        }
    }
}

/// Tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub format: LogFormat,
    pub filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: DEFAULT_FILTER.to_owned(),
        }
    }
}

impl TelemetryConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::UnknownFormat` if the format variable is set
    /// to something other than `json` or `pretty`.
    pub fn from_env() -> Result<Self, TelemetryError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    ///
    /// Unset or blank variables fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::UnknownFormat` for an unknown format.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TelemetryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v: &String| !v.trim().is_empty());

        let format = match non_blank(LOG_FORMAT_VAR) {
            Some(value) => value.parse()?,
            None => LogFormat::default(),
        };
        let filter = non_blank(FILTER_VAR).unwrap_or_else(|| DEFAULT_FILTER.to_owned());

        Ok(Self { format, filter })
    }
}

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` for an unparsable filter, or
/// `TelemetryError::AlreadyInitialized` if a subscriber is already set.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| TelemetryError::InvalidFilter(e.to_string()))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    installed.map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;

    tracing::debug!(format = %config.format, filter = %config.filter, "tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = TelemetryConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, TelemetryConfig::default());
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.filter, "info");
    }

    #[test]
    fn test_reads_format_and_filter() {
        let config = TelemetryConfig::from_lookup(lookup(&[
            (LOG_FORMAT_VAR, "Pretty"),
            (FILTER_VAR, "eventline_runtime=debug"),
        ]))
        .unwrap();

        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.filter, "eventline_runtime=debug");
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config =
            TelemetryConfig::from_lookup(lookup(&[(LOG_FORMAT_VAR, " "), (FILTER_VAR, "")]))
                .unwrap();

        assert_eq!(config, TelemetryConfig::default());
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let result = TelemetryConfig::from_lookup(lookup(&[(LOG_FORMAT_VAR, "xml")]));

        match result {
            Err(TelemetryError::UnknownFormat(value)) => assert_eq!(value, "xml"),
            other => panic!("expected UnknownFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_log_format_parses_case_insensitively() {
        assert_eq!(" PRETTY ".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("json".parse::<LogFormat>().unwrap().to_string(), "json");
    }
}
