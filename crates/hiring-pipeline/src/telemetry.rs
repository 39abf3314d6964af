//! Structured logging for the pipeline engine and its CLI.
//!
//! Movement outcomes, refusals and hook deliveries are logged under the `hiring_pipeline`
//! target. `RUST_LOG` replaces `APP_LOG_LEVEL` entirely when both are set, so
//! `RUST_LOG=hiring_pipeline=debug` is the quickest way to see ignored rejection payloads.

use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    /// The configured level is not a valid `EnvFilter` directive.
    EnvFilter { value: String, source: ParseError },
    /// A global subscriber was already set, usually by an earlier `init`.
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(f, "pipeline log filter '{value}' is not a valid directive")
            }
            TelemetryError::Subscriber(err) => {
                write!(f, "pipeline logging was already initialized: {err}")
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

fn pipeline_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::EnvFilter {
        value: config.log_level.clone(),
        source,
    })
}

/// Install the process-wide subscriber. Call once, before the first move is executed.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(pipeline_filter(config)?)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}
