//! Error types for the network-state engine

use std::sync::Arc;

use network_service::ServiceError;
use thiserror::Error;

use crate::logging::LoggingError;

/// Errors reported to callers of asynchronous operations
///
/// These are delivered through an [`ErrorCallback`], never returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// No available technology matches the requested pattern
    #[error("no available technology matches {pattern}")]
    TechnologyNotFound { pattern: String },

    /// The network service rejected a request
    #[error("request failed: {name}: {message}")]
    RequestFailed { name: String, message: String },
}

impl From<ServiceError> for NetworkError {
    fn from(err: ServiceError) -> Self {
        NetworkError::RequestFailed {
            name: err.name,
            message: err.message,
        }
    }
}

/// Callback receiving asynchronous failures
pub type ErrorCallback = Arc<dyn Fn(NetworkError) + Send + Sync>;

/// Errors from the context lifecycle and configuration
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("network handler is not initialized")]
    NotInitialized,

    #[error("network handler is already initialized")]
    AlreadyInitialized,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Logging(#[from] LoggingError),
}

/// Result type for context and configuration operations
pub type Result<T> = std::result::Result<T, HandlerError>;
