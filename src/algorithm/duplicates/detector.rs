//! Duplicate detection over local identities
//!
//! Detection keys exclusively on the adult subject. Identities carrying a
//! dependent are family records and never duplicate candidates; identities
//! without a subject first name or date of birth cannot be keyed and are
//! skipped as well.

use itertools::Itertools;
use log::debug;
use std::time::Instant;

use crate::models::{ClusterKey, DuplicateCluster, IdentityId, LocalIdentity};
use crate::utils::logging::{log_stage_complete, log_stage_start};

/// Grouping key of a subject-only identity, `None` when it is not a candidate
#[must_use]
pub fn cluster_key(identity: &LocalIdentity) -> Option<ClusterKey> {
    if identity.has_dependent() || identity.subject.first.is_empty() {
        return None;
    }
    Some(ClusterKey {
        dob: identity.subject.dob?,
        first: identity.subject.first.clone(),
        last: identity.subject.last.clone(),
    })
}

/// Group subject-only identities by (dob, first, last) and keep groups of two or more.
///
/// Clusters come back sorted by key; members are distinct and ascending.
#[must_use]
pub fn detect(identities: &[LocalIdentity]) -> Vec<DuplicateCluster> {
    let start = Instant::now();
    log_stage_start("Checking local identities for duplicates");

    let keyed: Vec<(ClusterKey, IdentityId)> = identities
        .iter()
        .filter_map(|identity| cluster_key(identity).map(|key| (key, identity.identity_id)))
        .sorted_unstable()
        .collect();
    debug!(
        "Checking duplicates in {} of {} identities",
        keyed.len(),
        identities.len()
    );

    let mut clusters = Vec::new();
    for (key, group) in &keyed.into_iter().chunk_by(|(key, _)| key.clone()) {
        let members = group.map(|(_, identity_id)| identity_id).dedup().collect();
        let cluster = DuplicateCluster { key, members };
        if cluster.len() > 1 {
            clusters.push(cluster);
        }
    }

    log_stage_complete("found duplicate clusters", clusters.len(), Some(start.elapsed()));
    clusters
}
