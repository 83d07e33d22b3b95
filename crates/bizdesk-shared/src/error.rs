//! Application error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Telemetry error: {0}")]
    TelemetryError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}
