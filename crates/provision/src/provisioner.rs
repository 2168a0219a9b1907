//! Version resolution and cache-or-download provisioning.

use std::path::PathBuf;

use secretsweep_core::Platform;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::cache::ToolCache;
use crate::release::{self, Release, ReleaseClient};
use crate::{Error, Result, extract};

/// What to provision: a tool at a requested version for one platform.
///
/// Immutable once constructed; one descriptor per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    /// Tool name, e.g. "gitleaks".
    pub name: String,
    /// "latest" or a pinned version, with or without a `v` prefix.
    pub requested_version: String,
    /// The resolved target platform.
    pub platform: Platform,
}

impl ToolDescriptor {
    /// Create a descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, requested_version: impl Into<String>, platform: Platform) -> Self {
        Self {
            name: name.into(),
            requested_version: requested_version.into(),
            platform,
        }
    }

    /// Expected release-asset name for a concrete version.
    #[must_use]
    pub fn asset_name(&self, version: &str) -> String {
        format!(
            "{}_{}_{}.{}",
            self.name,
            version,
            self.platform,
            self.platform.archive_ext()
        )
    }
}

/// Provisions scanner binaries into a local cache.
///
/// "latest" is resolved against the release index once per call and never
/// persisted, so a new run always sees newly published versions. Pinned
/// versions are served from the cache without any network traffic.
pub struct Provisioner {
    client: ReleaseClient,
    cache: ToolCache,
}

impl Provisioner {
    /// Create a provisioner against an index URL and a cache root.
    #[must_use]
    pub fn new(index_url: impl Into<String>, cache_root: PathBuf) -> Self {
        Self {
            client: ReleaseClient::new(index_url),
            cache: ToolCache::new(cache_root),
        }
    }

    /// Resolve, fetch if needed, and return the path to an executable binary.
    pub async fn provision(&self, descriptor: &ToolDescriptor) -> Result<PathBuf> {
        let binary_name = descriptor.platform.os.binary_name(&descriptor.name);

        // Dynamic "latest" resolution happens before the cache is consulted;
        // everything downstream works on a concrete version.
        let (version, release) = if descriptor.requested_version == "latest" {
            let releases = self.client.fetch_index().await?;
            let (version, release) =
                release::newest(&releases).ok_or_else(|| self.version_not_found(descriptor))?;
            debug!(%version, "resolved 'latest'");
            (version.to_string(), Some(release.clone()))
        } else {
            let version = descriptor.requested_version.trim_start_matches('v');
            (version.to_string(), None)
        };

        if let Some(path) = self
            .cache
            .lookup(&descriptor.name, &version, descriptor.platform, &binary_name)
        {
            info!(tool = %descriptor.name, %version, ?path, "using cached binary");
            return Ok(path);
        }

        let release = match release {
            Some(release) => release,
            None => {
                let releases = self.client.fetch_index().await?;
                release::find(&releases, &version)
                    .ok_or_else(|| self.version_not_found(descriptor))?
            }
        };

        let path = self
            .fetch_into_cache(descriptor, &version, &release, &binary_name)
            .await?;
        info!(tool = %descriptor.name, %version, ?path, "provisioned binary");
        Ok(path)
    }

    async fn fetch_into_cache(
        &self,
        descriptor: &ToolDescriptor,
        version: &str,
        release: &Release,
        binary_name: &str,
    ) -> Result<PathBuf> {
        let asset_name = descriptor.asset_name(version);
        let asset = release
            .assets
            .iter()
            .find(|asset| asset.name == asset_name)
            .ok_or_else(|| self.version_not_found(descriptor))?;

        let data = self.client.download(&asset.browser_download_url).await?;

        // Never publish unverified bytes under a cache key.
        if let Some(digest) = &asset.digest {
            verify_sha256(&data, digest, &asset_name)?;
        }

        let staging = self.cache.staging_dir();
        std::fs::create_dir_all(&staging)?;
        let prepared = (|| -> Result<()> {
            extract::unpack(&data, &asset_name, &staging)?;
            let found = extract::locate_binary(&staging, binary_name)?;
            let target = staging.join(binary_name);
            if found != target {
                std::fs::rename(&found, &target)?;
            }
            if descriptor.platform.os.needs_exec_bit() {
                extract::ensure_executable(&target)?;
            }
            Ok(())
        })();
        if let Err(err) = prepared {
            let _ = std::fs::remove_dir_all(&staging);
            return Err(err);
        }

        let entry = self
            .cache
            .entry_dir(&descriptor.name, version, descriptor.platform);
        self.cache.publish(&staging, &entry, binary_name)?;
        Ok(entry.join(binary_name))
    }

    fn version_not_found(&self, descriptor: &ToolDescriptor) -> Error {
        Error::VersionNotFound {
            tool: descriptor.name.clone(),
            version: descriptor.requested_version.clone(),
            platform: descriptor.platform.to_string(),
        }
    }
}

fn verify_sha256(data: &[u8], published: &str, asset_name: &str) -> Result<()> {
    let expected = published.trim_start_matches("sha256:").to_lowercase();
    let actual = hex::encode(Sha256::digest(data));
    if actual == expected {
        debug!(%asset_name, "checksum verified");
        Ok(())
    } else {
        Err(Error::integrity(asset_name, expected, actual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secretsweep_core::{Arch, Os};

    #[test]
    fn test_asset_name_composition() {
        let linux = ToolDescriptor::new(
            "gitleaks",
            "latest",
            Platform::new(Os::Linux, Arch::Amd64),
        );
        assert_eq!(linux.asset_name("8.18.4"), "gitleaks_8.18.4_linux_x64.tar.gz");

        let windows = ToolDescriptor::new(
            "gitleaks",
            "8.18.4",
            Platform::new(Os::Windows, Arch::Arm64),
        );
        assert_eq!(
            windows.asset_name("8.18.4"),
            "gitleaks_8.18.4_windows_arm64.zip"
        );
    }

    #[test]
    fn test_verify_sha256() {
        let data = b"archive bytes";
        let good = format!("sha256:{}", hex::encode(Sha256::digest(data)));
        assert!(verify_sha256(data, &good, "a.tar.gz").is_ok());

        // Digest without the algorithm prefix is accepted too.
        let bare = hex::encode(Sha256::digest(data));
        assert!(verify_sha256(data, &bare, "a.tar.gz").is_ok());

        let err = verify_sha256(data, "sha256:deadbeef", "a.tar.gz").unwrap_err();
        assert!(matches!(err, Error::Integrity { .. }));
    }
}
