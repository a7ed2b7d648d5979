//! Merging secret bundles under the no-duplicate-key rule.

use crate::error::MergeError;
use crate::secrets::{MergedResult, SecretBundle};
use std::collections::BTreeSet;
use tracing::error;

/// Incremental merge of secret bundles.
///
/// Bundles from independent paths must have disjoint key sets; a collision
/// is a misconfiguration and fails instead of shadowing a value.
#[derive(Debug, Default)]
pub struct PathMerger {
    merged: MergedResult,
}

impl PathMerger {
    /// Create an empty merger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one bundle into the accumulator.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::DuplicateKeys`] naming every key the bundle
    /// shares with the accumulator. The accumulator is left unchanged.
    pub fn push(&mut self, bundle: SecretBundle) -> Result<(), MergeError> {
        let duplicates: BTreeSet<String> = bundle
            .keys()
            .filter(|key| self.merged.contains_key(*key))
            .cloned()
            .collect();

        if !duplicates.is_empty() {
            error!(keys = ?duplicates, "Duplicate keys fetched");
            return Err(MergeError::DuplicateKeys { keys: duplicates });
        }

        self.merged.extend(bundle);
        Ok(())
    }

    /// Number of keys merged so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.merged.len()
    }

    /// Whether nothing has been merged yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.merged.is_empty()
    }

    /// Consume the merger and return the union.
    #[must_use]
    pub fn finish(self) -> MergedResult {
        self.merged
    }
}

/// Merge bundles in order into their union.
///
/// # Errors
///
/// Returns [`MergeError::DuplicateKeys`] on the first bundle whose keys
/// intersect those already merged.
pub fn merge<I>(bundles: I) -> Result<MergedResult, MergeError>
where
    I: IntoIterator<Item = SecretBundle>,
{
    let mut merger = PathMerger::new();
    for bundle in bundles {
        merger.push(bundle)?;
    }
    Ok(merger.finish())
}
