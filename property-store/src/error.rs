//! Error types for store mutations

use thiserror::Error;

/// Errors that can occur when applying properties to an entity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A full property dictionary lacked a key the entity requires
    #[error("malformed {kind} {path}: missing required property {key}")]
    MalformedEntity {
        kind: &'static str,
        path: String,
        key: &'static str,
    },

    /// The path is not part of the current list
    #[error("unknown {kind} {path}")]
    UnknownEntity { kind: &'static str, path: String },
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
