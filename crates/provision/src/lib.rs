//! Scanner binary provisioning for secretsweep.
//!
//! Resolves a requested scanner version ("latest" or pinned) against a
//! release index, downloads and verifies the platform-correct asset, and
//! publishes the extracted binary into a filesystem cache keyed by
//! (tool, version, platform). Cache publication is a single atomic rename,
//! so concurrent pipeline jobs sharing an agent can race on the same key
//! without ever observing a half-written entry.

mod cache;
mod error;
mod extract;
mod provisioner;
mod release;

pub use cache::ToolCache;
pub use error::{Error, Result};
pub use provisioner::{Provisioner, ToolDescriptor};
pub use release::{Asset, DEFAULT_RELEASE_INDEX, Release, ReleaseClient};
