use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;
use crate::error::AppError;

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), AppError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(&settings.level)?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))
}

fn build_filter(level: &str) -> Result<EnvFilter, AppError> {
    EnvFilter::try_new(level).map_err(|e| AppError::Logging(format!("invalid log level {level:?}: {e}")))
}
