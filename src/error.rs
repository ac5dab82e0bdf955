//! Centralized error types for inlinepgp.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the inlinepgp library.
#[derive(Error, Debug)]
pub enum PgpError {
    /// No crypto backend is configured or it failed to start.
    #[error("PGP backend is not available")]
    BackendUnavailable,

    /// The backend returned a non-zero exit code while decrypting.
    #[error("Decryption failed (exit code {exit_code}): {message}")]
    Decryption { exit_code: i32, message: String },

    /// The backend returned a non-zero exit code while encrypting or signing.
    #[error("Encryption failed (exit code {exit_code}): {message}")]
    Encryption { exit_code: i32, message: String },

    /// The user cancelled the operation.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// I/O error while talking to the backend program.
    #[error("I/O error running '{program}': {source}")]
    Io {
        program: PathBuf,
        source: std::io::Error,
    },

    /// The backend produced output we could not interpret.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Convenience alias for `Result<T, PgpError>`.
pub type Result<T> = std::result::Result<T, PgpError>;

impl PgpError {
    /// Create an `Io` variant from the program path and an `io::Error`.
    pub fn io(program: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            program: program.into(),
            source,
        }
    }
}
