//! Error types for Alpha Radar

use thiserror::Error;

/// Application-level errors.
///
/// Statuses that are part of normal operation (duplicate inserts, failed
/// alert deliveries, unavailable liquidity lookups) are not errors; they are
/// modeled as plain enums next to the operations that produce them.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error (fatal at startup)
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Database error. Fatal while connecting, transient per-operation
    /// afterwards.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Message transport failure after local recovery is exhausted
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
