//! Error types for change-scope resolution.

use thiserror::Error;

/// Result type for change-scope operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving a build's change set.
#[derive(Error, Debug)]
pub enum Error {
    /// The invoking identity lacks permission to read build changes.
    #[error("build API authentication failed (HTTP {status}); grant the pipeline identity access to build changes")]
    Auth {
        /// The HTTP status the API returned.
        status: u16,
    },

    /// The build API is unreachable or returned a server error.
    #[error("build API unavailable: {message}")]
    Unavailable {
        /// What went wrong.
        message: String,
    },

    /// IO error writing the scope file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}
