//! Error reported by the network service

use thiserror::Error;

/// A failed service call, as `(name, message)`
///
/// `name` is the service's machine-readable error identifier, `message` the
/// human-readable detail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}: {message}")]
pub struct ServiceError {
    pub name: String,
    pub message: String,
}

impl ServiceError {
    pub const UNKNOWN_OBJECT: &'static str = "org.netstate.Error.UnknownObject";
    pub const NOT_FOUND: &'static str = "org.netstate.Error.NotFound";
    pub const INVALID_ARGUMENTS: &'static str = "org.netstate.Error.InvalidArguments";
    pub const OPERATION_FAILED: &'static str = "org.netstate.Error.OperationFailed";

    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Error for a path the service does not know
    pub fn unknown_object(path: &str) -> Self {
        Self::new(Self::UNKNOWN_OBJECT, format!("no object at {path}"))
    }
}

/// Type alias for results of service calls
pub type Result<T> = std::result::Result<T, ServiceError>;
