//! Error types for quiesce-coordinator.
//!
//! These are the structural errors returned synchronously to the caller of
//! the offending method. Resources that fail or time out while closing are
//! not errors here; they are data in the [`ShutdownReport`](crate::ShutdownReport).

use thiserror::Error;

use crate::ids::ResourceId;

/// Errors returned by coordinator operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    /// A resource with this id is already registered.
    #[error("resource already registered: {0}")]
    AlreadyRegistered(ResourceId),

    /// No resource with this id is registered.
    #[error("resource not found: {0}")]
    NotFound(ResourceId),

    /// Shutdown has started or finished; the registry is frozen.
    #[error("coordinator closed: shutdown has already begun")]
    CoordinatorClosed,

    /// A shutdown sequence already ran or is running.
    #[error("shutdown already in progress or complete")]
    AlreadyShuttingDown,

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for coordinator operations.
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

impl From<config::ConfigError> for CoordinatorError {
    fn from(err: config::ConfigError) -> Self {
        CoordinatorError::Config(err.to_string())
    }
}
