//! Candidate index over local identities
//!
//! Candidates are kept in input order so that the first-found match of an
//! ambiguous key is the first qualifying identity in the local table.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::hash::Hash;

use crate::models::{IdentityId, LocalIdentity};

/// Identities per matching key, in input order and without repeats
pub type Candidates = SmallVec<[IdentityId; 2]>;

/// Lookup from a matching key to the local identities carrying it
#[derive(Debug)]
pub struct CandidateIndex<K> {
    candidates: FxHashMap<K, Candidates>,
}

impl<K: Eq + Hash> CandidateIndex<K> {
    /// Index every local identity for which `key` yields a value
    pub fn build<'a, F>(locals: &'a [LocalIdentity], key: F) -> Self
    where
        F: Fn(&'a LocalIdentity) -> Option<K>,
    {
        let mut candidates: FxHashMap<K, Candidates> = FxHashMap::default();
        for local in locals {
            if let Some(k) = key(local) {
                let entry = candidates.entry(k).or_default();
                if !entry.contains(&local.identity_id) {
                    entry.push(local.identity_id);
                }
            }
        }
        Self { candidates }
    }

    /// Identities carrying `key`, empty when none do
    #[must_use]
    pub fn candidates(&self, key: &K) -> &[IdentityId] {
        self.candidates
            .get(key)
            .map(|found| found.as_slice())
            .unwrap_or(&[])
    }

    /// Number of distinct keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether no identity was indexed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PersonKey;

    #[test]
    fn test_candidates_keep_input_order() {
        let locals = vec![
            LocalIdentity::new(7, PersonKey::default()).with_lab_id("lab-1"),
            LocalIdentity::new(3, PersonKey::default()).with_lab_id("lab-1"),
            LocalIdentity::new(4, PersonKey::default()),
        ];
        let index = CandidateIndex::build(&locals, |local| {
            (!local.external_lab_id.is_empty()).then_some(local.external_lab_id.as_str())
        });

        assert_eq!(index.len(), 1);
        assert_eq!(index.candidates(&"lab-1"), &[7, 3]);
        assert!(index.candidates(&"lab-2").is_empty());
    }
}
