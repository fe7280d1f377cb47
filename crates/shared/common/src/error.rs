//! Unified error handling for infrastructure failures.
//!
//! Covers everything outside the domain call itself: configuration, broker
//! connectivity and gRPC transport setup.

use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Configuration
    #[error("Configuration error: {0}")]
    Config(String),

    // External service errors
    #[cfg(feature = "broker")]
    #[error("Broker error: {0}")]
    Broker(#[from] redis::RedisError),

    #[cfg(feature = "grpc")]
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    // Internal
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get error code for logs and metrics labels
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            #[cfg(feature = "broker")]
            AppError::Broker(_) => "BROKER_ERROR",
            #[cfg(feature = "grpc")]
            AppError::Transport(_) => "TRANSPORT_ERROR",
            AppError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if retrying the failed operation later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Config(_) => false,
            #[cfg(feature = "broker")]
            AppError::Broker(e) => {
                e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
            }
            #[cfg(feature = "grpc")]
            AppError::Transport(_) => true,
            AppError::ServiceUnavailable(_) => true,
            AppError::Internal(_) => false,
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Convenience constructors
impl AppError {
    pub fn config(msg: impl Into<String>) -> Self {
        AppError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn service_unavailable(service: impl Into<String>) -> Self {
        AppError::ServiceUnavailable(service.into())
    }
}
