//! Core matching algorithm implementation
//!
//! The matcher resolves every remote record to an identity through a fixed
//! cascade. Each stage only sees the records left unmapped by the stages
//! before it:
//!
//! 1. carry forward links from the previous mapping and from local identities
//! 2. external laboratory identifier
//! 3. adult subject name and date of birth
//! 4. dependent name and date of birth
//! 5. allocation of a fresh identity
//!
//! Remote records are traversed in input order throughout, and candidates in
//! local input order, so the output only depends on the order of the inputs.

use log::{debug, info};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::time::Instant;

use super::allocation::IdAllocator;
use super::collapse::collapse;
use super::index::CandidateIndex;
use super::types::{MatchOutcome, MatchWarning};
use crate::config::ReconcileConfig;
use crate::error::{ReconcileError, Result};
use crate::models::{IdentityId, LocalIdentity, Mapping, MatchStage, RemoteRecord};
use crate::normalize::clean_text;
use crate::utils::logging::{log_stage_complete, log_stage_start, log_warning};

/// Identity and stage assigned to each remote record, position for position
type Assignments = Vec<Option<(IdentityId, MatchStage)>>;

/// Matcher for resolving remote records to local identities
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    /// Matching configuration
    config: ReconcileConfig,
}

impl Matcher {
    /// Create a new matcher with the given configuration
    #[must_use]
    pub const fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    /// Resolve every remote record to exactly one identity
    ///
    /// # Arguments
    ///
    /// * `locals` - Normalized local identities
    /// * `remotes` - Normalized remote records, one per remote record id
    /// * `previous` - Mapping from an earlier run, if any
    ///
    /// # Errors
    ///
    /// Returns `DuplicateRemoteRecord` when a remote record id occurs twice in
    /// `remotes`, and `IdentityExhausted` when no id is left to allocate.
    pub fn perform_matching(
        &self,
        locals: &[LocalIdentity],
        remotes: &[RemoteRecord],
        previous: Option<&Mapping>,
    ) -> Result<MatchOutcome> {
        let start_time = Instant::now();
        log_stage_start("Matching remote records to local identities");
        info!(
            "Matching {} remote records against {} local identities",
            remotes.len(),
            locals.len()
        );

        let mut positions: FxHashMap<&str, usize> = FxHashMap::default();
        for (position, remote) in remotes.iter().enumerate() {
            match positions.entry(remote.remote_record_id.as_str()) {
                Entry::Vacant(slot) => {
                    slot.insert(position);
                }
                Entry::Occupied(slot) => {
                    return Err(ReconcileError::DuplicateRemoteRecord {
                        remote_record_id: remote.remote_record_id.clone(),
                        first: *slot.get(),
                        second: position,
                    });
                }
            }
        }

        let mut assigned: Assignments = vec![None; remotes.len()];
        let mut warnings = Vec::new();

        let withdrawn = self.carry_forward(locals, previous, &positions, &mut assigned, &mut warnings);

        self.match_stage(
            MatchStage::LabId,
            locals,
            remotes,
            &mut assigned,
            &mut warnings,
            |local| (!local.external_lab_id.is_empty()).then_some(local.external_lab_id.as_str()),
            |remote| (!remote.external_lab_id.is_empty()).then_some(remote.external_lab_id.as_str()),
        );

        let adult_age = self.config.adult_age;
        self.match_stage(
            MatchStage::Subject,
            locals,
            remotes,
            &mut assigned,
            &mut warnings,
            |local| (!local.has_dependent() && local.subject.is_complete()).then_some(&local.subject),
            |remote| {
                (remote.is_adult(adult_age) && remote.subject.is_complete()).then_some(&remote.subject)
            },
        );

        self.match_stage(
            MatchStage::Dependent,
            locals,
            remotes,
            &mut assigned,
            &mut warnings,
            |local| (local.has_dependent() && local.dependent.is_complete()).then_some(&local.dependent),
            |remote| {
                (!remote.is_adult(adult_age) && remote.dependent.is_complete())
                    .then_some(&remote.dependent)
            },
        );

        let max_in_use = locals
            .iter()
            .map(|local| local.identity_id)
            .chain(previous.and_then(Mapping::max_identity_id))
            .max();
        let mut allocator = IdAllocator::after(max_in_use);
        let resolved: Vec<(IdentityId, MatchStage)> = assigned
            .into_iter()
            .map(|slot| match slot {
                Some(assignment) => Ok(assignment),
                None => allocator
                    .allocate()
                    .map(|identity_id| (identity_id, MatchStage::Allocated)),
            })
            .collect::<Result<_>>()?;

        let allocated = allocator.allocated();
        match &allocated {
            Some(range) => info!(
                "Newly allocated identity range: {} - {}",
                range.start(),
                range.end()
            ),
            None => info!("No new identity allocated"),
        }

        let (mapping, superseded) = collapse(remotes, &resolved);
        if !superseded.is_empty() {
            info!(
                "Collapsed {} superseded remote records onto more recent registrations",
                superseded.len()
            );
        }

        let matching_time = start_time.elapsed();
        log_stage_complete("matched remote records", mapping.len(), Some(matching_time));

        Ok(MatchOutcome {
            mapping,
            superseded,
            withdrawn,
            warnings,
            allocated,
            matching_time,
        })
    }

    /// Stage 1: keep links already established; returns withdrawn remote record ids
    fn carry_forward(
        &self,
        locals: &[LocalIdentity],
        previous: Option<&Mapping>,
        positions: &FxHashMap<&str, usize>,
        assigned: &mut Assignments,
        warnings: &mut Vec<MatchWarning>,
    ) -> Vec<String> {
        let sentinel = &self.config.missing_sentinel;
        let mut links: Vec<(String, IdentityId)> = previous
            .map(|mapping| {
                mapping
                    .pairs()
                    .map(|(remote_record_id, identity_id)| (clean_text(remote_record_id, sentinel), identity_id))
                    .collect()
            })
            .unwrap_or_default();

        if self.config.carry_forward_local_links {
            links.extend(
                locals
                    .iter()
                    .filter(|local| local.is_linked())
                    .map(|local| (local.remote_record_id.clone(), local.identity_id)),
            );
        }

        let mut withdrawn = Vec::new();
        let mut seen_withdrawn: FxHashSet<String> = FxHashSet::default();
        let mut carried = 0usize;

        for (remote_record_id, identity_id) in links {
            if remote_record_id.is_empty() {
                continue;
            }
            let Some(&position) = positions.get(remote_record_id.as_str()) else {
                if seen_withdrawn.insert(remote_record_id.clone()) {
                    debug!("Remote record {remote_record_id} is no longer in the remote registry");
                    withdrawn.push(remote_record_id);
                }
                continue;
            };

            let current = assigned[position];
            match current {
                None => {
                    assigned[position] = Some((identity_id, MatchStage::CarryForward));
                    carried += 1;
                }
                Some((chosen, _)) if chosen != identity_id => {
                    record_ambiguity(
                        warnings,
                        &remote_record_id,
                        MatchStage::CarryForward,
                        vec![chosen, identity_id],
                        chosen,
                    );
                }
                Some(_) => {}
            }
        }

        info!(
            "Stage {}: carried forward {} remote records ({} withdrawn)",
            MatchStage::CarryForward,
            carried,
            withdrawn.len()
        );
        withdrawn
    }

    /// Match still-unmapped remote records on an exact key
    #[allow(clippy::too_many_arguments)]
    fn match_stage<'a, K, FL, FR>(
        &self,
        stage: MatchStage,
        locals: &'a [LocalIdentity],
        remotes: &'a [RemoteRecord],
        assigned: &mut Assignments,
        warnings: &mut Vec<MatchWarning>,
        local_key: FL,
        remote_key: FR,
    ) where
        K: Eq + Hash,
        FL: Fn(&'a LocalIdentity) -> Option<K>,
        FR: Fn(&'a RemoteRecord) -> Option<K>,
    {
        let index = CandidateIndex::build(locals, local_key);
        if index.is_empty() {
            info!("Stage {stage}: no qualifying local identities");
            return;
        }

        let mut matched = 0usize;
        for (position, remote) in remotes.iter().enumerate() {
            if assigned[position].is_some() {
                continue;
            }
            let Some(key) = remote_key(remote) else {
                continue;
            };
            let candidates = index.candidates(&key);
            let Some(&chosen) = candidates.first() else {
                continue;
            };
            if candidates.len() > 1 {
                record_ambiguity(
                    warnings,
                    &remote.remote_record_id,
                    stage,
                    candidates.to_vec(),
                    chosen,
                );
            }
            assigned[position] = Some((chosen, stage));
            matched += 1;
        }

        info!("Stage {stage}: matched {matched} remote records");
    }
}

fn record_ambiguity(
    warnings: &mut Vec<MatchWarning>,
    remote_record_id: &str,
    stage: MatchStage,
    candidates: Vec<IdentityId>,
    chosen: IdentityId,
) {
    log_warning(
        &format!("Ambiguous {stage} match, candidates {candidates:?}, keeping identity {chosen}"),
        Some(remote_record_id),
    );
    warnings.push(MatchWarning::Ambiguous {
        remote_record_id: remote_record_id.to_string(),
        stage,
        candidates,
        chosen,
    });
}

/// Resolve remote records to identities with the default configuration
///
/// # Errors
///
/// See [`Matcher::perform_matching`].
pub fn match_records(
    locals: &[LocalIdentity],
    remotes: &[RemoteRecord],
    previous: Option<&Mapping>,
) -> Result<Mapping> {
    Ok(Matcher::default()
        .perform_matching(locals, remotes, previous)?
        .mapping)
}
