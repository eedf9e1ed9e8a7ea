//! Type definitions for the matching algorithm

use serde::Serialize;
use std::ops::RangeInclusive;
use std::time::Duration;

use crate::models::{IdentityId, Mapping, MatchStage, SupersededEntry};

/// Non-fatal conditions met while matching
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MatchWarning {
    /// A remote record qualified for more than one identity; the first won
    Ambiguous {
        /// The remote record
        remote_record_id: String,
        /// Stage where the ambiguity occurred
        stage: MatchStage,
        /// Qualifying identities in input order
        candidates: Vec<IdentityId>,
        /// The identity the record was assigned to
        chosen: IdentityId,
    },
}

/// Result of the matching process
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// One entry per retained (remote record, identity) pair
    pub mapping: Mapping,
    /// Remote records dropped by the collapse step
    pub superseded: Vec<SupersededEntry>,
    /// Carried-forward remote records no longer present in the remote registry
    pub withdrawn: Vec<String>,
    /// Ambiguous matches, resolved by input order
    pub warnings: Vec<MatchWarning>,
    /// Identity ids allocated for unmatched records
    pub allocated: Option<RangeInclusive<IdentityId>>,
    /// Time taken for matching
    pub matching_time: Duration,
}

impl MatchOutcome {
    /// Number of mapping entries produced by `stage`
    #[must_use]
    pub fn count_by_stage(&self, stage: MatchStage) -> usize {
        self.mapping
            .entries()
            .iter()
            .filter(|entry| entry.stage == stage)
            .count()
    }
}
