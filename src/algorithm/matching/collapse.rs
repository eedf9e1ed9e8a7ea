//! Collapse of historical multi-registrations
//!
//! A participant who registered more than once in the remote registry ends up
//! with several remote records resolving to one identity. Only the most
//! recently updated record is kept. A missing timestamp sorts before any
//! present one, and equal timestamps go to the lexicographically smallest
//! remote record id.

use rustc_hash::FxHashMap;
use std::cmp::Ordering;

use crate::models::{IdentityId, Mapping, MappingEntry, MatchStage, RemoteRecord, SupersededEntry};

/// Whether `candidate` should replace `current` as the record kept for an identity
#[must_use]
pub fn supersedes(candidate: &RemoteRecord, current: &RemoteRecord) -> bool {
    match candidate
        .last_update_timestamp
        .cmp(&current.last_update_timestamp)
    {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => candidate.remote_record_id < current.remote_record_id,
    }
}

/// Keep one remote record per identity.
///
/// `assigned` holds the identity and stage of each remote record, position
/// for position. Entries keep the input order of the remote records.
#[must_use]
pub fn collapse(
    remotes: &[RemoteRecord],
    assigned: &[(IdentityId, MatchStage)],
) -> (Mapping, Vec<SupersededEntry>) {
    let mut kept: FxHashMap<IdentityId, usize> = FxHashMap::default();
    for (position, (identity_id, _)) in assigned.iter().enumerate() {
        kept.entry(*identity_id)
            .and_modify(|current| {
                if supersedes(&remotes[position], &remotes[*current]) {
                    *current = position;
                }
            })
            .or_insert(position);
    }

    let mut entries = Vec::with_capacity(kept.len());
    let mut superseded = Vec::new();
    for (position, (identity_id, stage)) in assigned.iter().enumerate() {
        let winner = kept[identity_id];
        if winner == position {
            entries.push(MappingEntry {
                remote_record_id: remotes[position].remote_record_id.clone(),
                identity_id: *identity_id,
                stage: *stage,
            });
        } else {
            superseded.push(SupersededEntry {
                remote_record_id: remotes[position].remote_record_id.clone(),
                identity_id: *identity_id,
                kept: remotes[winner].remote_record_id.clone(),
            });
        }
    }

    (Mapping::new(entries), superseded)
}
