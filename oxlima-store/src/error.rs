//! Error types for the instance store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while working with the instance store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// An instance or disk name failed identifier validation.
    #[error("invalid identifier {name:?}: {reason}")]
    InvalidIdentifier {
        name: String,
        reason: &'static str,
    },

    /// The data directory could not be resolved (no home directory).
    #[error("cannot resolve the oxlima data directory")]
    DataDirUnavailable,

    /// A configuration document could not be decoded.
    #[error("failed to decode configuration document: {0}")]
    DocumentDecode(String),

    /// A configuration document decoded but is semantically invalid.
    #[error("invalid configuration document: {0}")]
    DocumentInvalid(String),

    /// A configuration document could not be re-encoded.
    #[error("failed to encode configuration document: {0}")]
    DocumentEncode(String),

    /// An enumerated instance directory has no configuration document.
    #[error("instance {instance:?} has no configuration document at {path}")]
    MissingConfig { instance: String, path: PathBuf },

    /// An external command could not be run or exited unsuccessfully.
    #[error("failed to run `{command}`: {source} (out={output:?})")]
    CommandFailed {
        command: String,
        output: String,
        #[source]
        source: std::io::Error,
    },

    /// The status command produced no output at all.
    #[error(
        "failed to read instance state for instance {instance:?}, \
         try running `wsl --list --verbose` to debug"
    )]
    EmptyStatusReport { instance: String },

    /// WSL is configured but no distribution is installed.
    #[error(
        "failed to read instance state for instance {instance:?} because no distro is installed, \
         try running `wsl --install -d Ubuntu` and then re-running oxlima"
    )]
    NoDistro { instance: String },

    /// WSL has no kernel component installed for this user.
    #[error(
        "failed to read instance state for instance {instance:?} because there is no WSL kernel installed, \
         this usually happens when WSL was installed for another user, but never for your user. \
         Try running `wsl --install -d Ubuntu` and `wsl --update`, and then re-running oxlima"
    )]
    NoKernel { instance: String },

    /// A pid file exists but does not contain a pid.
    #[error("unreadable pid file {path}: {reason}")]
    BadPidFile { path: PathBuf, reason: String },

    /// Underlying filesystem error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
