//! Duplicate cluster and resolution models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use super::types::IdentityId;

/// Grouping key of a duplicate cluster, ordered date of birth first
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterKey {
    /// Subject date of birth
    pub dob: NaiveDate,
    /// Subject first name
    pub first: String,
    /// Subject last name
    pub last: String,
}

/// Two or more subject-only identities sharing name and date of birth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCluster {
    /// Shared grouping key
    pub key: ClusterKey,
    /// Distinct member identities in ascending order
    pub members: SmallVec<[IdentityId; 4]>,
}

impl DuplicateCluster {
    /// Number of member identities
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the cluster has no members
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Which retention rule decided a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionReason {
    /// At least one member is linked to a remote record
    RemoteLinked,
    /// At least one member declined to participate
    Declined,
    /// Kept the most recently issued identity
    MostRecent,
}

impl ResolutionReason {
    /// Whether the cluster must be confirmed by a person before any action
    #[must_use]
    pub const fn requires_review(&self) -> bool {
        matches!(self, Self::RemoteLinked | Self::Declined)
    }

    /// Reason name used in logs and reports
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RemoteLinked => "remote_linked",
            Self::Declined => "declined",
            Self::MostRecent => "most_recent",
        }
    }
}

impl fmt::Display for ResolutionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for one cluster; `retained`, `deleted` and `review` partition its members
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterResolution {
    /// Key of the resolved cluster
    pub key: ClusterKey,
    /// Identities kept without further action
    pub retained: Vec<IdentityId>,
    /// Identities scheduled for deletion
    pub deleted: Vec<IdentityId>,
    /// Identities kept pending manual review
    pub review: Vec<IdentityId>,
    /// Rule that decided the cluster
    pub reason: ResolutionReason,
}

impl ClusterResolution {
    /// All members of the cluster, in ascending order
    #[must_use]
    pub fn members(&self) -> Vec<IdentityId> {
        let mut members: Vec<IdentityId> = self
            .retained
            .iter()
            .chain(&self.deleted)
            .chain(&self.review)
            .copied()
            .collect();
        members.sort_unstable();
        members
    }
}

/// The four named identity lists produced by a duplicate pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateReport {
    /// Per-cluster outcomes, sorted by cluster key
    pub resolutions: Vec<ClusterResolution>,
    /// Members of clusters held back because of a remote link
    pub remote_linked: Vec<IdentityId>,
    /// Members of clusters held back because of a decline
    pub declined: Vec<IdentityId>,
    /// Identities to delete
    pub to_delete: Vec<IdentityId>,
    /// Every clustered identity that is not deleted
    pub not_to_delete: Vec<IdentityId>,
}

impl DuplicateReport {
    /// Build the named lists from per-cluster outcomes
    #[must_use]
    pub fn from_resolutions(resolutions: Vec<ClusterResolution>) -> Self {
        let mut report = Self::default();
        for resolution in &resolutions {
            match resolution.reason {
                ResolutionReason::RemoteLinked => {
                    report.remote_linked.extend(&resolution.review);
                }
                ResolutionReason::Declined => report.declined.extend(&resolution.review),
                ResolutionReason::MostRecent => {}
            }
            report.to_delete.extend(&resolution.deleted);
            report
                .not_to_delete
                .extend(resolution.retained.iter().chain(&resolution.review));
        }
        report.resolutions = resolutions;
        report
    }

    /// Number of clusters that need a person to confirm them
    #[must_use]
    pub fn review_count(&self) -> usize {
        self.resolutions
            .iter()
            .filter(|resolution| resolution.reason.requires_review())
            .count()
    }
}
