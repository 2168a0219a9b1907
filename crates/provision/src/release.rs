//! Release index client.
//!
//! The release endpoint is treated as opaque: one GET for the version index
//! (a JSON list of tagged releases with their assets) and one GET per named
//! asset. No schema is assumed beyond "list of tags" and "downloadable
//! archive bytes", plus an optional per-asset sha256 digest when the index
//! publishes one.

use serde::Deserialize;
use tracing::debug;

use crate::{Error, Result};

/// Release index of the gitleaks scanner, the default tool this crate
/// provisions.
pub const DEFAULT_RELEASE_INDEX: &str = "https://api.github.com/repos/gitleaks/gitleaks/releases";

/// One published release from the index.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// Version tag, usually `v`-prefixed.
    pub tag_name: String,
    /// Downloadable assets for this release.
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// One downloadable archive published for a release.
#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    /// Asset file name.
    pub name: String,
    /// Direct download URL.
    pub browser_download_url: String,
    /// Published digest in `sha256:<hex>` form, when available.
    #[serde(default)]
    pub digest: Option<String>,
}

/// HTTP client against one release index.
pub struct ReleaseClient {
    http: reqwest::Client,
    index_url: String,
}

impl ReleaseClient {
    /// Create a client for the given index URL.
    #[must_use]
    pub fn new(index_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            index_url: index_url.into(),
        }
    }

    /// Fetch the full version index.
    pub async fn fetch_index(&self) -> Result<Vec<Release>> {
        debug!(url = %self.index_url, "fetching release index");
        let response = self
            .http
            .get(&self.index_url)
            .header("User-Agent", "secretsweep")
            .send()
            .await
            .map_err(|e| Error::download(&self.index_url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::download(
                &self.index_url,
                format!("HTTP {}", response.status()),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| Error::download(&self.index_url, e.to_string()))
    }

    /// Download a named asset, returning its raw bytes.
    ///
    /// An empty body is refused: a zero-byte archive means the endpoint
    /// misbehaved, not that the tool is empty.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        debug!(%url, "downloading release asset");
        let response = self
            .http
            .get(url)
            .header("User-Agent", "secretsweep")
            .send()
            .await
            .map_err(|e| Error::download(url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::download(url, format!("HTTP {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::download(url, e.to_string()))?;

        if bytes.is_empty() {
            return Err(Error::download(url, "empty response body"));
        }
        Ok(bytes.to_vec())
    }
}

/// Parse a release tag into a semantic version, tolerating a `v` prefix.
#[must_use]
pub(crate) fn parse_tag(tag: &str) -> Option<semver::Version> {
    semver::Version::parse(tag.trim_start_matches('v')).ok()
}

/// The newest published release by semantic-version ordering.
///
/// Releases with unparseable tags are skipped rather than failing the
/// resolution; the index occasionally carries non-release tags.
#[must_use]
pub(crate) fn newest(releases: &[Release]) -> Option<(semver::Version, &Release)> {
    releases
        .iter()
        .filter_map(|release| parse_tag(&release.tag_name).map(|version| (version, release)))
        .max_by(|(a, _), (b, _)| a.cmp(b))
}

/// Find the release matching a pinned version string.
#[must_use]
pub(crate) fn find(releases: &[Release], version: &str) -> Option<Release> {
    releases
        .iter()
        .find(|release| release.tag_name.trim_start_matches('v') == version)
        .cloned()
}
