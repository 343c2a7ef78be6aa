use crate::config::{AppEnvironment, TelemetryConfig};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log level/filter '{value}': unable to build EnvFilter")]
    EnvFilter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("telemetry error: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// `RUST_LOG` wins over the configured level when it parses.
fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => {
            EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::EnvFilter {
                value: config.log_level.clone(),
                source,
            })
        }
    }
}

pub fn init(environment: AppEnvironment, config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter(config)?;
    let interactive = environment == AppEnvironment::Development;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(interactive)
        .compact()
        .with_ansi(interactive)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}
