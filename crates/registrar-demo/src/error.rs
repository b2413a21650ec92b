//! Registrar demo — error types.

use registrar_core::config::InvalidSetting;
use registrar_core::error::StoreError;
use thiserror::Error;

/// Startup and runtime errors for the demo binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The event store rejected an operation.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<InvalidSetting> for AppError {
    fn from(err: InvalidSetting) -> Self {
        Self::Config(err.to_string())
    }
}
