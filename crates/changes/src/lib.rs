//! Change-scope resolution for secretsweep.
//!
//! Queries the build host's REST API for the changes associated with one
//! build, pages through the results via continuation tokens, and
//! materializes the unique commit identifiers into a scope file the scanner
//! consumes with `--commits-file`.
//!
//! Failure here always blocks the scan: running unscoped after a partial
//! fetch would silently widen (or narrow) what gets scanned, which is worse
//! than failing loudly.

mod changeset;
mod client;
mod error;

use std::path::{Path, PathBuf};

pub use changeset::{BuildChange, ChangeKind, ChangeSet};
pub use client::{BuildContext, CONTINUATION_HEADER, ChangesClient};
pub use error::{Error, Result};

/// Fetch every change for the build and write the scope file.
///
/// The change set is fully accumulated before anything is written, so an
/// API failure leaves no file behind.
pub async fn resolve_changes(
    client: &ChangesClient,
    context: &BuildContext,
    temp_dir: &Path,
) -> Result<PathBuf> {
    let changes = client.fetch_all(context).await?;
    changes.write_commits_file(temp_dir, &context.build_id)
}
