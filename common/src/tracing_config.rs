//! Tracing subscriber setup.
//!
//! Logs go to stderr; stdout is reserved for command output such as the
//! merged secrets printed by `vault-env read`.

use crate::error::PlatformError;
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line output
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(PlatformError::invalid_input(format!(
                "unknown log format {other:?}, expected text or json"
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `warn` or
    /// `vault_env=debug`
    pub default_directive: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_directive: "warn".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl TracingConfig {
    /// Set the fallback filter directive.
    #[must_use]
    pub fn with_log_level(mut self, directive: impl Into<String>) -> Self {
        self.default_directive = directive.into();
        self
    }

    /// Set the output format.
    #[must_use]
    pub const fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Filter from `RUST_LOG`, falling back to the configured directive.
    ///
    /// # Errors
    ///
    /// Returns an error if `RUST_LOG` is unset and the configured directive
    /// does not parse.
    pub fn filter(&self) -> Result<EnvFilter, PlatformError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.default_directive).map_err(|e| {
            PlatformError::invalid_input(format!(
                "invalid log filter {:?}: {e}",
                self.default_directive
            ))
        })
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a global subscriber is
/// already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<(), PlatformError> {
    let filter = config.filter()?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };
    result.map_err(|e| PlatformError::invalid_input(format!("tracing already initialized: {e}")))?;

    tracing::debug!(format = %config.format, "Tracing initialized");
    Ok(())
}
