use crate::config::{AppConfig, TelemetryConfig};
use tracing::info;
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

/// Installs the global fmt subscriber. `RUST_LOG` wins over the configured level.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::EnvFilter {
                value: config.log_level.clone(),
                source,
            })?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

/// Startup banner: where we run and where the workbooks are looked up.
pub fn log_startup(config: &AppConfig) {
    let deployment = if config.hosted { "render" } else { "local" };
    info!(
        ?config.environment,
        deployment,
        port = config.server.port,
        data_dir = %config.data.data_dir.display(),
        "warranty dashboard starting"
    );
    for dir in &config.data.search_dirs {
        tracing::debug!(dir = %dir.display(), exists = dir.is_dir(), "workbook search directory");
    }
}
