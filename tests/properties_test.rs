//! Property-based tests for matching and duplicate resolution
//!
//! Names, dates and lab ids are drawn from small pools so that collisions,
//! ambiguous candidates and duplicate clusters are common.

use chrono::NaiveDate;
use proptest::prelude::*;
use rustc_hash::FxHashSet;

use registry_reconcile::{
    DeclineFlags, LocalIdentity, Mapping, MatchStage, Matcher, PersonKey, ReconcileConfig,
    RemoteRecord, detect, find_and_resolve,
};

const FIRST: [&str; 3] = ["amy", "bob", "cy"];
const LAST: [&str; 2] = ["lee", "ng"];

fn dob(index: usize) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1980 + i32::try_from(index).unwrap_or(0), 1, 1)
}

fn person(first: usize, last: usize, date: usize) -> PersonKey {
    PersonKey::new(FIRST[first], LAST[last], dob(date))
}

prop_compose! {
    fn arb_local(identity_id: u64, remote_count: usize)(
        first in 0..3usize,
        last in 0..2usize,
        date in 0..2usize,
        link in prop::option::weighted(0.2, 0..remote_count.max(1)),
        declined in prop::bool::weighted(0.2),
        lab in prop::option::weighted(0.2, 0..3usize),
        dependent in prop::option::weighted(0.2, (0..3usize, 0..2usize)),
    ) -> LocalIdentity {
        let mut identity = LocalIdentity::new(identity_id, person(first, last, date));
        if let Some(link) = link {
            identity = identity.with_remote_record(format!("r{link}"));
        }
        if declined {
            identity = identity.with_decline_flags(DeclineFlags::new("", "9", ""));
        }
        if let Some(lab) = lab {
            identity = identity.with_lab_id(format!("lab{lab}"));
        }
        if let Some((first, last)) = dependent {
            identity = identity.with_dependent(person(first, last, 30));
        }
        identity
    }
}

prop_compose! {
    fn arb_remote(index: usize)(
        first in 0..3usize,
        last in 0..2usize,
        date in 0..2usize,
        minor in prop::bool::weighted(0.3),
        lab in prop::option::weighted(0.2, 0..3usize),
        stamp in prop::option::of(0..3u32),
    ) -> RemoteRecord {
        let age = if minor { 8 } else { 40 };
        let mut record = RemoteRecord::new(format!("r{index}"), person(first, last, date), age);
        if minor {
            record = record.with_dependent(person(first, last, 30));
        }
        if let Some(lab) = lab {
            record = record.with_lab_id(format!("lab{lab}"));
        }
        if let Some(day) = stamp {
            let at = NaiveDate::from_ymd_opt(2023, 1, 1 + day)
                .and_then(|date| date.and_hms_opt(12, 0, 0));
            if let Some(at) = at {
                record = record.with_last_update(at);
            }
        }
        record
    }
}

/// An earlier run's mapping. Record ids run past `remote_count` so that some
/// of them are withdrawn, and identity ids reach above every local id.
fn arb_previous(remote_count: usize) -> impl Strategy<Value = Option<Mapping>> {
    prop::option::weighted(
        0.6,
        prop::collection::vec((0..remote_count + 3, 1..60u64), 0..8).prop_map(|pairs| {
            Mapping::from_pairs(
                pairs
                    .into_iter()
                    .map(|(record, identity_id)| (format!("r{record}"), identity_id)),
            )
        }),
    )
}

type Tables = (Vec<LocalIdentity>, Vec<RemoteRecord>, Option<Mapping>);

fn arb_tables() -> impl Strategy<Value = Tables> {
    (0..10usize, 0..10usize).prop_flat_map(|(local_count, remote_count)| {
        let locals: Vec<_> = (0..local_count)
            .map(|position| arb_local(position as u64 * 3 + 2, remote_count))
            .collect();
        let remotes: Vec<_> = (0..remote_count).map(arb_remote).collect();
        (locals, remotes, arb_previous(remote_count))
    })
}

proptest! {
    #[test]
    fn prop_matching_is_deterministic((locals, remotes, previous) in arb_tables()) {
        let matcher = Matcher::default();
        let first = matcher.perform_matching(&locals, &remotes, previous.as_ref()).unwrap();
        let second = matcher.perform_matching(&locals, &remotes, previous.as_ref()).unwrap();
        prop_assert_eq!(first.mapping, second.mapping);
        prop_assert_eq!(first.superseded, second.superseded);
        prop_assert_eq!(first.withdrawn, second.withdrawn);
        prop_assert_eq!(first.warnings, second.warnings);
        prop_assert_eq!(detect(&locals), detect(&locals));
    }

    #[test]
    fn prop_every_remote_record_is_accounted_for((locals, remotes, previous) in arb_tables()) {
        let outcome = Matcher::default()
            .perform_matching(&locals, &remotes, previous.as_ref())
            .unwrap();

        let mapped: Vec<&str> = outcome.mapping.pairs().map(|(id, _)| id).collect();
        let mapped_set: FxHashSet<&str> = mapped.iter().copied().collect();
        prop_assert_eq!(mapped.len(), mapped_set.len());

        let identities: FxHashSet<u64> = outcome.mapping.pairs().map(|(_, id)| id).collect();
        prop_assert_eq!(identities.len(), outcome.mapping.len());

        prop_assert_eq!(outcome.mapping.len() + outcome.superseded.len(), remotes.len());
        for entry in &outcome.superseded {
            prop_assert!(!mapped_set.contains(entry.remote_record_id.as_str()));
            prop_assert_eq!(outcome.mapping.identity_for(&entry.kept), Some(entry.identity_id));
        }
    }

    #[test]
    fn prop_withdrawn_records_are_exactly_the_vanished_links((locals, remotes, previous) in arb_tables()) {
        let outcome = Matcher::default()
            .perform_matching(&locals, &remotes, previous.as_ref())
            .unwrap();

        let present: FxHashSet<&str> =
            remotes.iter().map(|remote| remote.remote_record_id.as_str()).collect();
        let linked: FxHashSet<&str> = previous
            .iter()
            .flat_map(|mapping| mapping.pairs().map(|(id, _)| id))
            .chain(
                locals
                    .iter()
                    .filter(|local| local.is_linked())
                    .map(|local| local.remote_record_id.as_str()),
            )
            .collect();
        let expected: FxHashSet<&str> = linked.difference(&present).copied().collect();

        let withdrawn: FxHashSet<&str> = outcome.withdrawn.iter().map(String::as_str).collect();
        prop_assert_eq!(withdrawn.len(), outcome.withdrawn.len());
        prop_assert_eq!(withdrawn, expected);
    }

    #[test]
    fn prop_carried_links_survive_unless_collapsed((locals, remotes, previous) in arb_tables()) {
        let outcome = Matcher::default()
            .perform_matching(&locals, &remotes, previous.as_ref())
            .unwrap();
        let Some(previous) = previous else {
            return Ok(());
        };

        let present: FxHashSet<&str> =
            remotes.iter().map(|remote| remote.remote_record_id.as_str()).collect();
        let first_links = previous.lookup();
        for (remote_record_id, identity_id) in first_links {
            if !present.contains(remote_record_id) {
                continue;
            }
            match outcome.mapping.identity_for(remote_record_id) {
                Some(mapped) => prop_assert_eq!(mapped, identity_id),
                None => {
                    let entry = outcome
                        .superseded
                        .iter()
                        .find(|entry| entry.remote_record_id == remote_record_id);
                    prop_assert_eq!(entry.map(|entry| entry.identity_id), Some(identity_id));
                }
            }
        }
    }

    #[test]
    fn prop_allocated_ids_exceed_existing_ids((locals, remotes, previous) in arb_tables()) {
        let max_existing = locals
            .iter()
            .map(|local| local.identity_id)
            .chain(previous.iter().flat_map(|mapping| mapping.pairs().map(|(_, id)| id)))
            .max()
            .unwrap_or(0);
        let outcome = Matcher::default()
            .perform_matching(&locals, &remotes, previous.as_ref())
            .unwrap();

        let allocated: Vec<u64> = outcome
            .mapping
            .entries()
            .iter()
            .filter(|entry| entry.stage == MatchStage::Allocated)
            .map(|entry| entry.identity_id)
            .collect();
        for identity_id in &allocated {
            prop_assert!(*identity_id > max_existing);
        }
        if let Some(range) = &outcome.allocated {
            prop_assert_eq!(*range.start(), max_existing + 1);
            for identity_id in &allocated {
                prop_assert!(range.contains(identity_id));
            }
        }
    }

    #[test]
    fn prop_resolution_partitions_each_cluster((locals, _remotes, _previous) in arb_tables()) {
        let report = find_and_resolve(&locals, &ReconcileConfig::default()).unwrap();
        let clusters = detect(&locals);
        prop_assert_eq!(clusters.len(), report.resolutions.len());

        for (cluster, resolution) in clusters.iter().zip(&report.resolutions) {
            prop_assert_eq!(&cluster.key, &resolution.key);
            let members = resolution.members();
            prop_assert_eq!(members.as_slice(), cluster.members.as_slice());

            let distinct: FxHashSet<u64> = members.iter().copied().collect();
            prop_assert_eq!(distinct.len(), members.len());
        }
    }

    #[test]
    fn prop_linked_or_declined_identities_are_never_deleted(
        (locals, _remotes, _previous) in arb_tables()
    ) {
        let report = find_and_resolve(&locals, &ReconcileConfig::default()).unwrap();
        for identity in &locals {
            if identity.is_linked() || identity.has_declined("9") {
                prop_assert!(!report.to_delete.contains(&identity.identity_id));
            }
        }
    }
}
