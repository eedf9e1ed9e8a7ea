//! Tests for the matching cascade

mod utils;

use registry_reconcile::algorithm::matching::{
    assign_rows, identity_batches, name_mismatches,
};
use registry_reconcile::{
    FieldProfile, LocalIdentity, Mapping, MatchStage, MatchWarning, Matcher, PersonKey,
    ReconcileConfig, ReconcileError, RemoteRecord, match_records, normalize_local,
    normalize_remote,
};
use utils::{date, local, local_row, remote, remote_row};

fn pairs(mapping: &Mapping) -> Vec<(String, u64)> {
    mapping
        .pairs()
        .map(|(remote_record_id, identity_id)| (remote_record_id.to_string(), identity_id))
        .collect()
}

#[test]
fn test_subject_match_is_case_insensitive() {
    let locals = normalize_local(&[local_row("1", "jane", "doe", "1990-01-01", &[])]).unwrap();
    let remotes = normalize_remote(&[remote_row(
        "r1",
        "Jane",
        "Doe",
        "1990-01-01",
        &[("age", "33")],
    )])
    .unwrap();

    let outcome = Matcher::default().perform_matching(&locals, &remotes, None).unwrap();
    assert_eq!(pairs(&outcome.mapping), vec![("r1".to_string(), 1)]);
    assert_eq!(outcome.mapping.entries()[0].stage, MatchStage::Subject);
    assert!(outcome.allocated.is_none());
}

#[test]
fn test_empty_locals_allocate_from_one() {
    let remotes = vec![remote("r9", "max", "roe", "1985-02-02")];
    let mapping = match_records(&[], &remotes, None).unwrap();
    assert_eq!(pairs(&mapping), vec![("r9".to_string(), 1)]);
}

#[test]
fn test_allocation_follows_input_order_above_max_id() {
    let locals = vec![local(4, "ann", "ash", "1970-01-01"), local(11, "ben", "bay", "1971-01-01")];
    let remotes = vec![
        remote("r3", "zed", "zee", "1990-01-01"),
        remote("r1", "ann", "ash", "1970-01-01"),
        remote("r2", "yan", "yew", "1991-01-01"),
    ];

    let outcome = Matcher::default().perform_matching(&locals, &remotes, None).unwrap();
    assert_eq!(
        pairs(&outcome.mapping),
        vec![
            ("r3".to_string(), 12),
            ("r1".to_string(), 4),
            ("r2".to_string(), 13)
        ]
    );
    assert_eq!(outcome.allocated, Some(12..=13));
    assert_eq!(outcome.count_by_stage(MatchStage::Allocated), 2);
}

#[test]
fn test_previous_mapping_is_carried_forward() {
    let locals = vec![local(1, "jane", "doe", "1990-01-01")];
    let remotes = vec![remote("r1", "jane", "doe", "1990-01-01")];
    let previous = Mapping::from_pairs([("R1", 7), ("r5", 30)]);

    let outcome = Matcher::default()
        .perform_matching(&locals, &remotes, Some(&previous))
        .unwrap();
    assert_eq!(pairs(&outcome.mapping), vec![("r1".to_string(), 7)]);
    assert_eq!(outcome.mapping.entries()[0].stage, MatchStage::CarryForward);
    assert_eq!(outcome.withdrawn, vec!["r5".to_string()]);
}

#[test]
fn test_allocation_respects_previous_mapping_ids() {
    let remotes = vec![remote("r1", "new", "one", "2001-01-01")];
    let previous = Mapping::from_pairs([("r0", 50)]);
    let locals = vec![local(3, "x", "y", "1960-01-01")];
    let mapping = match_records(&locals, &remotes, Some(&previous)).unwrap();
    assert_eq!(pairs(&mapping), vec![("r1".to_string(), 51)]);
}

#[test]
fn test_previous_mapping_wins_over_conflicting_local_link() {
    let locals = vec![local(7, "jane", "doe", "1990-01-01").with_remote_record("r1")];
    let remotes = vec![remote("r1", "jane", "doe", "1990-01-01")];
    let previous = Mapping::from_pairs([("r1", 3)]);

    let outcome = Matcher::default()
        .perform_matching(&locals, &remotes, Some(&previous))
        .unwrap();
    assert_eq!(pairs(&outcome.mapping), vec![("r1".to_string(), 3)]);
    assert_eq!(
        outcome.warnings,
        vec![MatchWarning::Ambiguous {
            remote_record_id: "r1".to_string(),
            stage: MatchStage::CarryForward,
            candidates: vec![3, 7],
            chosen: 3,
        }]
    );
}

#[test]
fn test_repeated_remote_record_id_is_rejected() {
    let record = remote("r1", "jane", "doe", "1990-01-01");
    let remotes = vec![record.clone(), remote("r2", "bob", "ray", "1970-05-05"), record];

    match match_records(&[], &remotes, None) {
        Err(ReconcileError::DuplicateRemoteRecord {
            remote_record_id,
            first,
            second,
        }) => {
            assert_eq!(remote_record_id, "r1");
            assert_eq!((first, second), (0, 2));
        }
        other => panic!("expected DuplicateRemoteRecord, got {other:?}"),
    }
}

#[test]
fn test_allocation_past_the_largest_id_is_an_error() {
    let locals = normalize_local(&[local_row(
        "18446744073709551615",
        "jane",
        "doe",
        "1990-01-01",
        &[],
    )])
    .unwrap();

    let matched = vec![remote("r1", "jane", "doe", "1990-01-01")];
    let mapping = match_records(&locals, &matched, None).unwrap();
    assert_eq!(pairs(&mapping), vec![("r1".to_string(), u64::MAX)]);

    let unmatched = vec![remote("r2", "new", "person", "2001-01-01")];
    assert!(matches!(
        match_records(&locals, &unmatched, None),
        Err(ReconcileError::IdentityExhausted(u64::MAX))
    ));
}

#[test]
fn test_local_link_is_carried_forward() {
    let locals = vec![local(5, "jane", "doe", "1990-01-01").with_remote_record("r2")];
    let remotes = vec![remote("r2", "janet", "smith", "1991-01-01")];

    let outcome = Matcher::default().perform_matching(&locals, &remotes, None).unwrap();
    assert_eq!(pairs(&outcome.mapping), vec![("r2".to_string(), 5)]);

    let config = ReconcileConfig::builder().carry_forward_local_links(false).build();
    let outcome = Matcher::new(config).perform_matching(&locals, &remotes, None).unwrap();
    assert_eq!(outcome.mapping.entries()[0].stage, MatchStage::Allocated);
    assert_eq!(pairs(&outcome.mapping), vec![("r2".to_string(), 6)]);
}

#[test]
fn test_lab_id_takes_precedence_over_subject() {
    let locals = vec![
        local(1, "jane", "doe", "1990-01-01"),
        local(2, "other", "person", "1950-01-01").with_lab_id("lab-9"),
    ];
    let remotes = vec![remote("r1", "jane", "doe", "1990-01-01").with_lab_id("lab-9")];

    let outcome = Matcher::default().perform_matching(&locals, &remotes, None).unwrap();
    assert_eq!(pairs(&outcome.mapping), vec![("r1".to_string(), 2)]);
    assert_eq!(outcome.mapping.entries()[0].stage, MatchStage::LabId);
}

#[test]
fn test_minor_matches_on_dependent_only() {
    let kid = PersonKey::new("tom", "lee", Some(date("2015-03-03")));
    let parent = PersonKey::new("amy", "lee", Some(date("1980-01-01")));
    let locals = vec![
        LocalIdentity::new(1, parent.clone()),
        LocalIdentity::new(2, parent.clone()).with_dependent(kid.clone()),
    ];
    let remotes = vec![RemoteRecord::new("r1", parent, 8).with_dependent(kid)];

    let outcome = Matcher::default().perform_matching(&locals, &remotes, None).unwrap();
    assert_eq!(pairs(&outcome.mapping), vec![("r1".to_string(), 2)]);
    assert_eq!(outcome.mapping.entries()[0].stage, MatchStage::Dependent);
}

#[test]
fn test_adult_does_not_match_dependent_bearing_identity() {
    let kid = PersonKey::new("tom", "lee", Some(date("2015-03-03")));
    let locals = vec![local(1, "amy", "lee", "1980-01-01").with_dependent(kid)];
    let remotes = vec![remote("r1", "amy", "lee", "1980-01-01")];

    let outcome = Matcher::default().perform_matching(&locals, &remotes, None).unwrap();
    assert_eq!(outcome.mapping.entries()[0].stage, MatchStage::Allocated);
    assert_eq!(pairs(&outcome.mapping), vec![("r1".to_string(), 2)]);
}

#[test]
fn test_incomplete_keys_never_match() {
    let locals = vec![LocalIdentity::new(1, PersonKey::new("jane", "doe", None))];
    let remotes = vec![RemoteRecord::new("r1", PersonKey::new("jane", "doe", None), 40)];

    let outcome = Matcher::default().perform_matching(&locals, &remotes, None).unwrap();
    assert_eq!(outcome.mapping.entries()[0].stage, MatchStage::Allocated);
}

#[test]
fn test_ambiguous_match_keeps_first_candidate_and_warns() {
    let locals = vec![local(8, "jane", "doe", "1990-01-01"), local(3, "jane", "doe", "1990-01-01")];
    let remotes = vec![remote("r1", "jane", "doe", "1990-01-01")];

    let outcome = Matcher::default().perform_matching(&locals, &remotes, None).unwrap();
    assert_eq!(pairs(&outcome.mapping), vec![("r1".to_string(), 8)]);
    assert_eq!(
        outcome.warnings,
        vec![MatchWarning::Ambiguous {
            remote_record_id: "r1".to_string(),
            stage: MatchStage::Subject,
            candidates: vec![8, 3],
            chosen: 8,
        }]
    );
}

#[test]
fn test_multi_registration_collapses_to_latest() {
    let locals = vec![local(1, "jane", "doe", "1990-01-01")];
    let older = date("2022-01-01").and_hms_opt(9, 0, 0).unwrap();
    let newer = date("2023-06-01").and_hms_opt(9, 0, 0).unwrap();
    let remotes = vec![
        remote("r1", "jane", "doe", "1990-01-01").with_last_update(newer),
        remote("r2", "jane", "doe", "1990-01-01").with_last_update(older),
        remote("r3", "jane", "doe", "1990-01-01"),
    ];

    let outcome = Matcher::default().perform_matching(&locals, &remotes, None).unwrap();
    assert_eq!(pairs(&outcome.mapping), vec![("r1".to_string(), 1)]);
    let superseded: Vec<(&str, &str)> = outcome
        .superseded
        .iter()
        .map(|entry| (entry.remote_record_id.as_str(), entry.kept.as_str()))
        .collect();
    assert_eq!(superseded, vec![("r2", "r1"), ("r3", "r1")]);
}

#[test]
fn test_timestamp_tie_keeps_smallest_record_id() {
    let locals = vec![local(1, "jane", "doe", "1990-01-01")];
    let stamp = date("2023-06-01").and_hms_opt(9, 0, 0).unwrap();
    let remotes = vec![
        remote("r7", "jane", "doe", "1990-01-01").with_last_update(stamp),
        remote("r4", "jane", "doe", "1990-01-01").with_last_update(stamp),
    ];

    let mapping = match_records(&locals, &remotes, None).unwrap();
    assert_eq!(pairs(&mapping), vec![("r4".to_string(), 1)]);
}

#[test]
fn test_name_mismatches_are_reported() {
    let locals = vec![local(5, "jane", "doe", "1990-01-01").with_remote_record("r2")];
    let remotes = vec![remote("r2", "janet", "doe", "1990-01-01")];

    let mapping = match_records(&locals, &remotes, None).unwrap();
    let mismatches = name_mismatches(&mapping, &locals, &remotes);
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].local_first, "jane");
    assert_eq!(mismatches[0].remote_first, "janet");
}

#[test]
fn test_rows_of_one_identity_share_a_batch() {
    let raw = vec![
        remote_row("r1", "a", "a", "1990-01-01", &[]),
        remote_row("r2", "b", "b", "1990-01-02", &[]),
        remote_row("r1", "", "", "", &[("repeat_instrument_name", "visit")]),
        remote_row("r3", "c", "c", "1990-01-03", &[]),
    ];
    let config = ReconcileConfig::default();
    let remotes = normalize_remote(&raw).unwrap();
    let mapping = match_records(&[], &remotes, None).unwrap();

    let assigned = assign_rows(&mapping, &raw, &FieldProfile::canonical(), &config);
    assert_eq!(assigned.len(), 4);
    assert_eq!(assigned[2].remote_record_id, "r1");
    assert_eq!(assigned[2].position, 2);

    let batches = identity_batches(&assigned, 2);
    assert_eq!(batches.len(), 2);
    let first: Vec<u64> = batches[0].iter().map(|row| row.identity_id).collect();
    assert_eq!(first, vec![1, 2, 1]);
    let second: Vec<u64> = batches[1].iter().map(|row| row.identity_id).collect();
    assert_eq!(second, vec![3]);
}
