//! Error types for bundling operations.
//!
//! [`Error`] covers infrastructure failures (filesystem, process spawning,
//! invalid patterns). Strategy-level failures that the pipeline recovers from
//! locally live next to the components that produce them:
//! [`BuildFailure`](crate::bundler::BuildFailure),
//! [`WrapFailure`](crate::bundler::WrapFailure) and
//! [`DiscoveryMiss`](crate::bundler::DiscoveryMiss).

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Result type alias for bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while packaging.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Free-form error with a message.
    #[error("{0}")]
    GenericError(String),

    /// Raw IO error without path context.
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    /// IO error annotated with what was being done and to which path.
    #[error("{context} ({}): {source}", path.display())]
    Fs {
        /// What the bundler was doing.
        context: String,
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A search pattern failed to parse.
    #[error("invalid search pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Underlying parse error.
        source: glob::PatternError,
    },

    /// An external program could not be started.
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// An external program did not finish in time.
    #[error("`{program}` did not finish within {}s", timeout.as_secs())]
    Timeout {
        /// Program that was invoked.
        program: String,
        /// Timeout that elapsed.
        timeout: Duration,
    },

    /// Directory traversal error.
    #[error("{0}")]
    Walk(#[from] walkdir::Error),

    /// Path prefix error while relativising paths.
    #[error("{0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Attach a path and a description to IO results.
pub trait ErrorExt<T> {
    /// Wraps an IO error as [`Error::Fs`].
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|source| Error::Fs {
            context: context.to_string(),
            path: path.as_ref().to_path_buf(),
            source,
        })
    }
}

/// Attach a message to an error or a missing value.
pub trait Context<T> {
    /// Adds a static message.
    fn context<C: Display>(self, context: C) -> Result<T>;

    /// Adds a lazily built message.
    fn with_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

impl<T> Context<T> for Result<T> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{context}: {e}")))
    }

    fn with_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{}: {e}", f())))
    }
}

/// Returns early with a [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)))
    };
}
