//! Logging initialization
//!
//! Structured `tracing` output with an `EnvFilter` read from `RUST_LOG`.
//! JSON lines by default for in-cluster use, compact text for terminals.
//! Logs go to stderr so command output on stdout stays machine-readable.

use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info,bootbucket=debug";

/// Environment variable selecting the log format
pub const LOG_FORMAT_ENV: &str = "BOOTBUCKET_LOG_FORMAT";

/// Errors that can occur during telemetry initialization
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Unknown log format name
    #[error("unknown log format '{0}', expected 'json' or 'text'")]
    UnknownFormat(String),

    /// Failed to initialize tracing subscriber
    #[error("failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Output format of log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line with span context
    #[default]
    Json,
    /// Human-readable single-line output
    Text,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "pretty" => Ok(Self::Text),
            other => Err(TelemetryError::UnknownFormat(other.to_string())),
        }
    }
}

/// Configuration for telemetry initialization
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Log line format
    pub format: LogFormat,

    /// Filter directives applied when `RUST_LOG` is unset
    pub default_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            default_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Build a configuration from `BOOTBUCKET_LOG_FORMAT`, falling back to defaults
    pub fn from_env() -> Result<Self, TelemetryError> {
        let format = match std::env::var(LOG_FORMAT_ENV) {
            Ok(value) => value.parse()?,
            Err(_) => LogFormat::default(),
        };
        Ok(Self {
            format,
            ..Default::default()
        })
    }
}

/// Initialize the global tracing subscriber
///
/// Fails if a global subscriber was already installed.
pub fn init_telemetry(config: TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match config.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    result.map_err(|e: tracing_subscriber::util::TryInitError| {
        TelemetryError::SubscriberInit(e.to_string())
    })
}
