//! Error types for provisioning operations.
//!
//! All of these are fatal to the run: no scan may execute against an
//! absent or unverified binary.

use thiserror::Error;

/// Result type for provisioning operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while provisioning the scanner binary.
#[derive(Error, Debug)]
pub enum Error {
    /// The agent's OS/architecture pair has no published binary.
    #[error(transparent)]
    UnsupportedPlatform(#[from] secretsweep_core::UnsupportedPlatform),

    /// The requested version has no matching published asset.
    #[error("no release asset matches {tool} {version} for {platform}")]
    VersionNotFound {
        /// Tool name.
        tool: String,
        /// The requested version string.
        version: String,
        /// The resolved platform tag.
        platform: String,
    },

    /// Network or HTTP failure while talking to the release endpoint.
    #[error("download failed for {url}: {message}")]
    Download {
        /// The URL that failed.
        url: String,
        /// What went wrong.
        message: String,
    },

    /// Downloaded bytes do not match the published checksum.
    #[error("checksum mismatch for {asset}: expected {expected}, got {actual}")]
    Integrity {
        /// The asset name.
        asset: String,
        /// The published digest.
        expected: String,
        /// The computed digest.
        actual: String,
    },

    /// The downloaded archive could not be unpacked.
    #[error("failed to extract '{archive}': {message}")]
    Extraction {
        /// The archive name.
        archive: String,
        /// What went wrong.
        message: String,
    },

    /// The expected binary is missing from the extracted archive.
    #[error("binary '{0}' not found in archive")]
    BinaryNotFound(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a download error.
    #[must_use]
    pub fn download(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Download {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an extraction error.
    #[must_use]
    pub fn extraction(archive: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            archive: archive.into(),
            message: message.into(),
        }
    }

    /// Create an integrity error.
    #[must_use]
    pub fn integrity(
        asset: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::Integrity {
            asset: asset.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}
