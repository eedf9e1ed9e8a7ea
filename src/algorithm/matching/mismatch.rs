//! Name mismatch report for mapped pairs.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::models::{IdentityId, LocalIdentity, Mapping, RemoteRecord};

/// A mapped pair whose subject first names disagree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameMismatch {
    pub remote_record_id: String,
    pub identity_id: IdentityId,
    pub local_first: String,
    pub local_last: String,
    pub remote_first: String,
    pub remote_last: String,
}

/// Mapped pairs where both sides carry a subject first name and the names differ
#[must_use]
pub fn name_mismatches(
    mapping: &Mapping,
    locals: &[LocalIdentity],
    remotes: &[RemoteRecord],
) -> Vec<NameMismatch> {
    let locals_by_id: FxHashMap<IdentityId, &LocalIdentity> = locals
        .iter()
        .map(|local| (local.identity_id, local))
        .collect();
    let remotes_by_id: FxHashMap<&str, &RemoteRecord> = remotes
        .iter()
        .map(|remote| (remote.remote_record_id.as_str(), remote))
        .collect();

    mapping
        .pairs()
        .filter_map(|(remote_record_id, identity_id)| {
            let local = locals_by_id.get(&identity_id)?;
            let remote = remotes_by_id.get(remote_record_id)?;
            let both_named = !local.subject.first.is_empty() && !remote.subject.first.is_empty();
            (both_named && local.subject.first != remote.subject.first).then(|| NameMismatch {
                remote_record_id: remote_record_id.to_string(),
                identity_id,
                local_first: local.subject.first.clone(),
                local_last: local.subject.last.clone(),
                remote_first: remote.subject.first.clone(),
                remote_last: remote.subject.last.clone(),
            })
        })
        .collect()
}
