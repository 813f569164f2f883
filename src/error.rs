//! Application-level error types.
//!
//! Pipeline failures come from [`crate::packager::Error`]; this layer adds
//! argument handling and project discovery on top.

use thiserror::Error;

use crate::project::MissingResourceError;

/// Result type alias for application operations
pub type Result<T> = std::result::Result<T, PackError>;

/// Main error type for the command line tool
#[derive(Error, Debug)]
pub enum PackError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Packaging pipeline errors
    #[error("Packaging error: {0}")]
    Pack(#[from] crate::packager::Error),

    /// Version or resource lookup errors
    #[error("{0}")]
    MissingResource(#[from] MissingResourceError),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Logging could not be set up
    #[error("Failed to configure logging: {reason}")]
    Logging {
        /// Reason for the error
        reason: String,
    },
}
