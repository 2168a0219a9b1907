//! Change accumulation and scope-file output.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::Result;

/// How a file was changed in a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// File added.
    Add,
    /// File edited.
    Edit,
    /// File deleted.
    Delete,
    /// File renamed.
    Rename,
}

/// One changed item as reported by the build API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildChange {
    /// Path of the changed file.
    pub file_path: String,
    /// Kind of change.
    pub change_kind: ChangeKind,
    /// Commit the change belongs to.
    pub commit_id: String,
}

/// A deduplicated set of build changes.
///
/// Entries are unique by (file path, commit id) and kept in first-seen
/// order, so identical input always produces identical output.
#[derive(Debug, Default)]
pub struct ChangeSet {
    entries: Vec<BuildChange>,
    seen: HashSet<(String, String)>,
}

impl ChangeSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a change, returning whether it was new.
    pub fn insert(&mut self, change: BuildChange) -> bool {
        let key = (change.file_path.clone(), change.commit_id.clone());
        if self.seen.insert(key) {
            self.entries.push(change);
            true
        } else {
            false
        }
    }

    /// Number of unique changes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The accumulated changes in first-seen order.
    #[must_use]
    pub fn entries(&self) -> &[BuildChange] {
        &self.entries
    }

    /// Unique commit ids in first-seen order.
    ///
    /// A commit touching several files appears once.
    #[must_use]
    pub fn commit_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|change| seen.insert(change.commit_id.as_str()))
            .map(|change| change.commit_id.as_str())
            .collect()
    }

    /// Write the scope file: one commit id per line, UTF-8, no metadata.
    ///
    /// Written in a single shot only after the whole set was accumulated.
    pub fn write_commits_file(&self, dir: &Path, build_id: &str) -> Result<PathBuf> {
        let path = dir.join(format!("commits-{build_id}.txt"));
        let mut contents = self.commit_ids().join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        std::fs::write(&path, contents)?;
        debug!(?path, commits = self.commit_ids().len(), "wrote scope file");
        Ok(path)
    }
}
