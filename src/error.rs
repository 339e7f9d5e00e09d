//! Error types for the command line tool.
//!
//! This module defines all error types with actionable error messages and recovery suggestions.
//! Exhausting every strategy is not an error; it is a normal
//! [`PipelineOutcome`](crate::bundler::PipelineOutcome) with its own report.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for the binary
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bundler errors
    #[error("Bundler error: {0}")]
    Bundler(#[from] crate::bundler::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
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
}

impl BundlerError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        use crate::bundler::Error;

        match self {
            Self::Cli(_) => vec!["Run with --help to see accepted arguments".to_string()],
            Self::Bundler(Error::Fs { path, .. }) => vec![format!(
                "Check permissions on {} and that no other process holds it",
                path.display()
            )],
            Self::Bundler(Error::Spawn { .. } | Error::Timeout { .. }) => vec![
                "Install the Xcode command line tools or pass --xcodebuild".to_string(),
                "Raise --timeout-secs if the build is slow".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
