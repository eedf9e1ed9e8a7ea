//! Retention decisions for duplicate clusters
//!
//! Rules apply in order and the first that fires decides the cluster:
//!
//! 1. a member is linked to a remote record: every member goes to review
//! 2. a member declined to participate: every member goes to review
//! 3. otherwise the highest identity is kept and the rest are deleted

use log::info;
use rustc_hash::FxHashMap;
use std::time::Instant;

use crate::config::ReconcileConfig;
use crate::error::{ReconcileError, Result};
use crate::models::{
    ClusterResolution, DuplicateCluster, DuplicateReport, IdentityId, LocalIdentity,
    ResolutionReason,
};
use crate::utils::logging::{log_stage_complete, log_stage_start};

/// Index identities by id for cluster resolution
#[must_use]
pub fn index_identities(identities: &[LocalIdentity]) -> FxHashMap<IdentityId, &LocalIdentity> {
    identities
        .iter()
        .map(|identity| (identity.identity_id, identity))
        .collect()
}

/// Resolver deciding which cluster members to keep
#[derive(Debug, Clone)]
pub struct DuplicateResolver {
    decline_code: String,
}

impl Default for DuplicateResolver {
    fn default() -> Self {
        Self::new(&ReconcileConfig::default())
    }
}

impl DuplicateResolver {
    /// Create a resolver using the configured decline code
    #[must_use]
    pub fn new(config: &ReconcileConfig) -> Self {
        Self {
            decline_code: config.decline_code.clone(),
        }
    }

    /// Decide the outcome of one cluster
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::UnknownIdentity`] when a member is missing
    /// from `identities_by_id`.
    pub fn resolve(
        &self,
        cluster: &DuplicateCluster,
        identities_by_id: &FxHashMap<IdentityId, &LocalIdentity>,
    ) -> Result<ClusterResolution> {
        let members = cluster
            .members
            .iter()
            .map(|identity_id| {
                identities_by_id
                    .get(identity_id)
                    .copied()
                    .ok_or(ReconcileError::UnknownIdentity(*identity_id))
            })
            .collect::<Result<Vec<&LocalIdentity>>>()?;

        let mut ids: Vec<IdentityId> = members.iter().map(|member| member.identity_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let held_back = if members.iter().any(|member| member.is_linked()) {
            Some(ResolutionReason::RemoteLinked)
        } else if members
            .iter()
            .any(|member| member.has_declined(&self.decline_code))
        {
            Some(ResolutionReason::Declined)
        } else {
            None
        };

        let resolution = match held_back {
            Some(reason) => ClusterResolution {
                key: cluster.key.clone(),
                retained: Vec::new(),
                deleted: Vec::new(),
                review: ids,
                reason,
            },
            None => {
                let retained = ids.pop().into_iter().collect();
                ClusterResolution {
                    key: cluster.key.clone(),
                    retained,
                    deleted: ids,
                    review: Vec::new(),
                    reason: ResolutionReason::MostRecent,
                }
            }
        };
        Ok(resolution)
    }

    /// Resolve every cluster and gather the named identity lists
    pub fn resolve_all(
        &self,
        clusters: &[DuplicateCluster],
        identities: &[LocalIdentity],
    ) -> Result<DuplicateReport> {
        let start = Instant::now();
        log_stage_start("Resolving duplicate clusters");

        let identities_by_id = index_identities(identities);
        let resolutions = clusters
            .iter()
            .map(|cluster| self.resolve(cluster, &identities_by_id))
            .collect::<Result<Vec<_>>>()?;
        let report = DuplicateReport::from_resolutions(resolutions);

        info!(
            "Duplicate resolution: {} remote linked, {} declined, {} to delete, {} kept",
            report.remote_linked.len(),
            report.declined.len(),
            report.to_delete.len(),
            report.not_to_delete.len()
        );
        log_stage_complete(
            "resolved duplicate clusters",
            report.resolutions.len(),
            Some(start.elapsed()),
        );
        Ok(report)
    }
}

/// Resolve one cluster with the default decline code
pub fn resolve(
    cluster: &DuplicateCluster,
    identities_by_id: &FxHashMap<IdentityId, &LocalIdentity>,
) -> Result<ClusterResolution> {
    DuplicateResolver::default().resolve(cluster, identities_by_id)
}
