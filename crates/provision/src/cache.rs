//! Filesystem tool cache.
//!
//! Layout: `<root>/<tool>/<version>/<platform>/<binary>`. One entry per
//! (tool, version, platform) key. The cache directory is shared across
//! concurrent pipeline jobs on the same agent, so entries are only ever
//! published by renaming a fully extracted staging directory into place.

use std::path::{Path, PathBuf};

use secretsweep_core::Platform;
use tracing::{debug, trace, warn};

use crate::Result;

/// Filesystem-backed cache of provisioned scanner binaries.
///
/// The root is injected rather than ambient so tests can run against a
/// temporary directory.
#[derive(Debug, Clone)]
pub struct ToolCache {
    root: PathBuf,
}

impl ToolCache {
    /// Create a cache at the specified root directory.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Get the cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the entry for a (tool, version, platform) key.
    #[must_use]
    pub fn entry_dir(&self, tool: &str, version: &str, platform: Platform) -> PathBuf {
        self.root
            .join(tool)
            .join(version)
            .join(platform.to_string())
    }

    /// Look up a cached binary.
    ///
    /// A missing or corrupt entry (file absent, or present without the
    /// executable bit on unix) is a miss, never an error; a corrupt entry is
    /// removed so the subsequent publish can take its place.
    #[must_use]
    pub fn lookup(
        &self,
        tool: &str,
        version: &str,
        platform: Platform,
        binary_name: &str,
    ) -> Option<PathBuf> {
        let entry = self.entry_dir(tool, version, platform);
        let path = entry.join(binary_name);
        if !path.is_file() {
            trace!(?path, "cache miss");
            return None;
        }
        if platform.os.needs_exec_bit() && !is_executable(&path) {
            warn!(?path, "cached binary lost its executable bit, evicting");
            let _ = std::fs::remove_dir_all(&entry);
            return None;
        }
        trace!(?path, "cache hit");
        Some(path)
    }

    /// A uniquely named staging directory under the cache root.
    ///
    /// Staging lives on the same filesystem as the entries so the publish
    /// rename stays atomic.
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(format!(".staging-{}", uuid::Uuid::new_v4()))
    }

    /// Atomically publish a fully extracted staging directory under a key.
    ///
    /// A concurrent provisioner may have published the same key first; both
    /// writers produce identical bytes for identical keys, so losing the
    /// rename race to a complete entry is success.
    pub fn publish(&self, staging: &Path, entry: &Path, binary_name: &str) -> Result<()> {
        if let Some(parent) = entry.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // A stale half-entry (dir without the binary) would block the rename.
        if entry.exists() && !entry.join(binary_name).is_file() {
            let _ = std::fs::remove_dir_all(entry);
        }
        match std::fs::rename(staging, entry) {
            Ok(()) => {
                debug!(?entry, "published cache entry");
                Ok(())
            }
            Err(_) if entry.join(binary_name).is_file() => {
                debug!(?entry, "lost publish race to concurrent provisioner");
                let _ = std::fs::remove_dir_all(staging);
                Ok(())
            }
            Err(err) => {
                let _ = std::fs::remove_dir_all(staging);
                Err(err.into())
            }
        }
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}
