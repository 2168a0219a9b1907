//! Build-changes REST client.
//!
//! Pages through `GET {collection}/{project}/_apis/build/builds/{id}/changes`
//! and keeps requesting while the response carries a continuation-token
//! header. Page size and token semantics belong to the API; nothing here
//! assumes a fixed total.

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::changeset::{BuildChange, ChangeSet};
use crate::{Error, Result};

/// Response header carrying the opaque continuation token.
pub const CONTINUATION_HEADER: &str = "x-ms-continuationtoken";

/// Identifies the build whose changes are being resolved.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Collection/organization base URI.
    pub collection_uri: String,
    /// Project name or id.
    pub project: String,
    /// Build id.
    pub build_id: String,
    /// Access token of the pipeline identity.
    pub token: String,
}

impl BuildContext {
    fn changes_url(&self) -> String {
        format!(
            "{}/{}/_apis/build/builds/{}/changes",
            self.collection_uri.trim_end_matches('/'),
            self.project,
            self.build_id
        )
    }
}

/// One page of the changes endpoint.
#[derive(Debug, Deserialize)]
struct ChangesPage {
    #[serde(default)]
    value: Vec<BuildChange>,
}

/// HTTP client for the build-changes endpoint.
#[derive(Default)]
pub struct ChangesClient {
    http: reqwest::Client,
}

impl ChangesClient {
    /// Create a client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch every change for the build, following continuation tokens.
    ///
    /// No retries: re-requesting a failed page could silently drop earlier
    /// pages' worth of scope, and an under-scoped scan is a correctness
    /// hazard rather than a degraded one.
    pub async fn fetch_all(&self, context: &BuildContext) -> Result<ChangeSet> {
        let url = context.changes_url();
        let mut changes = ChangeSet::new();
        let mut continuation: Option<String> = None;
        let mut page_count = 0u32;

        loop {
            let mut request = self
                .http
                .get(&url)
                .query(&[("api-version", "7.1")])
                .bearer_auth(&context.token);
            if let Some(token) = &continuation {
                request = request.query(&[("continuationToken", token.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| Error::unavailable(e.to_string()))?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(Error::Auth {
                    status: status.as_u16(),
                });
            }
            if !status.is_success() {
                return Err(Error::unavailable(format!("HTTP {status} from {url}")));
            }

            continuation = response
                .headers()
                .get(CONTINUATION_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);

            let page: ChangesPage = response
                .json()
                .await
                .map_err(|e| Error::unavailable(format!("malformed changes page: {e}")))?;

            page_count += 1;
            debug!(page = page_count, items = page.value.len(), "fetched changes page");
            for change in page.value {
                changes.insert(change);
            }

            if continuation.is_none() {
                break;
            }
        }

        debug!(total = changes.len(), pages = page_count, "change set complete");
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changes_url() {
        let context = BuildContext {
            collection_uri: "https://dev.example.com/org/".to_string(),
            project: "proj".to_string(),
            build_id: "42".to_string(),
            token: String::new(),
        };
        assert_eq!(
            context.changes_url(),
            "https://dev.example.com/org/proj/_apis/build/builds/42/changes"
        );
    }
}
