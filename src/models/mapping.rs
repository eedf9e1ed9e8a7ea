//! Remote record to identity mapping
//!
//! The mapping is recomputed on every run. Its natural partition key for
//! downstream batches is the identity id: rows that share an identity must be
//! written together.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::IdentityId;

/// The matcher stage that produced a mapping entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    /// Kept from a previous mapping or an existing local link
    CarryForward,
    /// Matched on the external laboratory identifier
    LabId,
    /// Matched on the adult subject's name and date of birth
    Subject,
    /// Matched on the dependent's name and date of birth
    Dependent,
    /// No match; a new identity was allocated
    Allocated,
}

impl MatchStage {
    /// Stage name used in logs and reports
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CarryForward => "carry_forward",
            Self::LabId => "lab_id",
            Self::Subject => "subject",
            Self::Dependent => "dependent",
            Self::Allocated => "allocated",
        }
    }
}

impl fmt::Display for MatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resolved (remote record, identity) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Remote record identifier
    pub remote_record_id: String,
    /// Identity the record resolves to
    pub identity_id: IdentityId,
    /// Stage that produced the pair
    pub stage: MatchStage,
}

/// A remote record dropped by the collapse step in favour of a more recent one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupersededEntry {
    /// The dropped remote record
    pub remote_record_id: String,
    /// Identity both records resolved to
    pub identity_id: IdentityId,
    /// The remote record kept for the identity
    pub kept: String,
}

/// The relation remote record id to identity id, one identity per record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    entries: Vec<MappingEntry>,
}

impl Mapping {
    /// Create a mapping from already resolved entries
    #[must_use]
    pub fn new(entries: Vec<MappingEntry>) -> Self {
        Self { entries }
    }

    /// Create a mapping from plain pairs, e.g. a mapping stored by an earlier run
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, IdentityId)>,
        S: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(remote_record_id, identity_id)| MappingEntry {
                remote_record_id: remote_record_id.into(),
                identity_id,
                stage: MatchStage::CarryForward,
            })
            .collect();
        Self { entries }
    }

    /// The entries in output order
    #[must_use]
    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The (remote record id, identity id) pairs
    pub fn pairs(&self) -> impl Iterator<Item = (&str, IdentityId)> {
        self.entries
            .iter()
            .map(|entry| (entry.remote_record_id.as_str(), entry.identity_id))
    }

    /// Largest identity id in the mapping
    #[must_use]
    pub fn max_identity_id(&self) -> Option<IdentityId> {
        self.entries.iter().map(|entry| entry.identity_id).max()
    }

    /// Lookup table from remote record id to identity id.
    ///
    /// When a remote record id occurs more than once the first entry wins.
    #[must_use]
    pub fn lookup(&self) -> FxHashMap<&str, IdentityId> {
        let mut lookup = FxHashMap::default();
        for entry in &self.entries {
            lookup
                .entry(entry.remote_record_id.as_str())
                .or_insert(entry.identity_id);
        }
        lookup
    }

    /// Identity a remote record resolves to
    #[must_use]
    pub fn identity_for(&self, remote_record_id: &str) -> Option<IdentityId> {
        self.entries
            .iter()
            .find(|entry| entry.remote_record_id == remote_record_id)
            .map(|entry| entry.identity_id)
    }
}

/// Split rows into batches of at most `batch_size` distinct identities.
///
/// Identities are ordered by first appearance and all rows of one identity
/// land in the same batch, in input order. A `batch_size` of zero is treated
/// as one.
pub fn batch_by_identity<T, F>(rows: &[T], key: F, batch_size: usize) -> Vec<Vec<&T>>
where
    F: Fn(&T) -> IdentityId,
{
    let batch_size = batch_size.max(1);
    let mut positions: FxHashMap<IdentityId, usize> = FxHashMap::default();
    let mut batches: Vec<Vec<&T>> = Vec::new();

    for row in rows {
        let next = positions.len();
        let position = *positions.entry(key(row)).or_insert(next);
        let batch = position / batch_size;
        if batch >= batches.len() {
            batches.resize_with(batch + 1, Vec::new);
        }
        batches[batch].push(row);
    }

    batches
}
