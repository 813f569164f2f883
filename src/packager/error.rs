//! Error types for the packaging pipeline.
//!
//! Every stage of resolving, fetching, unpacking and building a requirement
//! reports failures through [`Error`]. Callers decide whether an error is
//! fatal: the resolver isolates errors per requirement, the assembler
//! propagates them.

use std::{fmt::Display, io, path::PathBuf};
use thiserror::Error as DeriveError;

use super::utils::cmd::CommandResult;

/// Result type alias for packaging operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the packaging pipeline.
#[derive(Debug, DeriveError)]
pub enum Error {
    /// No distribution could be found for a requirement.
    #[error("no distribution found for requirement `{requirement}`: {reason}")]
    Resolution {
        /// Requirement as written.
        requirement: String,
        /// What the finder tried.
        reason: String,
    },

    /// A requirement line could not be parsed.
    #[error("invalid requirement `{0}`")]
    InvalidRequirement(String),

    /// Downloaded file has a suffix the unpacker cannot handle.
    #[error("unrecognized archive format: {0}")]
    UnrecognizedFormat(String),

    /// Archive extracted but no entry matched the project name.
    #[error("no top-level directory starting with `{prefix}` in {}", archive.display())]
    TopLevelDirNotFound {
        /// Expected name prefix.
        prefix: String,
        /// Archive that was extracted.
        archive: PathBuf,
    },

    /// External command exited with a non-zero status.
    #[error("command `{command}` failed: {result}")]
    CommandFailed {
        /// Command line that was executed.
        command: String,
        /// Exit code and captured output.
        result: CommandResult,
    },

    /// External command could not be started.
    #[error("failed to run command `{command}`: {error}")]
    CommandSpawn {
        /// Command line that was executed.
        command: String,
        /// Underlying spawn error.
        error: io::Error,
    },

    /// External command exceeded the configured timeout and was killed.
    #[error("command `{command}` timed out after {seconds}s")]
    CommandTimeout {
        /// Command line that was executed.
        command: String,
        /// Timeout that elapsed.
        seconds: u64,
    },

    /// Download failed.
    #[error("download of {url} failed: {reason}")]
    Download {
        /// URL being fetched.
        url: String,
        /// Failure reason.
        reason: String,
    },

    /// Downloaded file does not match the digest published by the index.
    #[error("sha256 mismatch for {}: expected {expected}, got {actual}", path.display())]
    HashMismatch {
        /// Downloaded file.
        path: PathBuf,
        /// Digest from the index.
        expected: String,
        /// Digest of the downloaded bytes.
        actual: String,
    },

    /// Zip archive error.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Filesystem error with the operation and path that caused it.
    #[error("{context} {}: {error}", path.display())]
    Fs {
        /// Operation being performed.
        context: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        error: io::Error,
    },

    /// Plain IO error.
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// Directory walk error.
    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Path prefix error.
    #[error(transparent)]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Anything else.
    #[error("{0}")]
    GenericError(String),
}

/// Attach filesystem context to IO results.
pub trait ErrorExt<T> {
    /// Maps an IO error into [`Error::Fs`] naming the operation and path.
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

/// Attach a free-form message to errors and empty options.
pub trait Context<T> {
    /// Converts the failure into [`Error::GenericError`] prefixed by `msg`.
    fn context<C>(self, msg: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, msg: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::GenericError(format!("{msg}: {e}")))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, msg: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(msg.to_string()))
    }
}

/// Return early with an [`Error::GenericError`].
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::packager::Error::GenericError(format!($msg)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::packager::Error::GenericError(format!($fmt, $($arg)*)))
    };
}
