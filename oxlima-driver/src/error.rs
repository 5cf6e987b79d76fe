//! Error types for the driver abstraction layer.

use thiserror::Error;

/// Errors that can occur during driver operations.
#[derive(Error, Debug)]
pub enum DriverError {
    /// A driver with the same identifier is already registered.
    #[error("driver already registered: {0}")]
    AlreadyRegistered(String),

    /// The backend is not usable on the current host.
    #[error("backend not available on this host: {0}")]
    Unavailable(String),

    /// The instance configuration is missing something the driver needs.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The instance does not exist on this backend.
    #[error("instance not found: {0}")]
    InstanceNotFound(String),

    /// The instance is in the wrong state for the requested operation.
    #[error("invalid instance state for operation: {0}")]
    InvalidState(String),

    /// General operation failure.
    #[error("operation failed: {0}")]
    OperationFailed(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Error surfaced by the instance store.
    #[error(transparent)]
    Store(#[from] oxlima_store::StoreError),

    /// Underlying I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;
