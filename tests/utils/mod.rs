//! Shared fixtures for integration tests
#![allow(dead_code)]

use chrono::NaiveDate;
use registry_reconcile::{LocalIdentity, PersonKey, RawRow, RemoteRecord};

/// Build a raw row from column/value pairs
#[must_use]
pub fn row(pairs: &[(&str, &str)]) -> RawRow {
    pairs
        .iter()
        .map(|(column, value)| ((*column).to_string(), (*value).to_string()))
        .collect()
}

/// A canonical local row for a standalone subject; `overrides` replace defaults
#[must_use]
pub fn local_row(identity_id: &str, first: &str, last: &str, dob: &str, overrides: &[(&str, &str)]) -> RawRow {
    let mut raw = row(&[
        ("identity_id", identity_id),
        ("remote_record_id", ""),
        ("subject_first", first),
        ("subject_last", last),
        ("subject_dob", dob),
        ("dependent_first", ""),
        ("dependent_last", ""),
        ("dependent_dob", ""),
        ("external_lab_id", ""),
        ("decline_1", ""),
        ("decline_2", ""),
        ("decline_3", ""),
    ]);
    for (column, value) in overrides {
        raw.insert((*column).to_string(), (*value).to_string());
    }
    raw
}

/// A canonical remote row for an adult subject; `overrides` replace defaults
#[must_use]
pub fn remote_row(record_id: &str, first: &str, last: &str, dob: &str, overrides: &[(&str, &str)]) -> RawRow {
    let mut raw = row(&[
        ("remote_record_id", record_id),
        ("subject_first", first),
        ("subject_last", last),
        ("subject_dob", dob),
        ("age", "40"),
        ("dependent_first", ""),
        ("dependent_last", ""),
        ("dependent_dob", ""),
        ("external_lab_id", ""),
        ("last_update_timestamp", ""),
    ]);
    for (column, value) in overrides {
        raw.insert((*column).to_string(), (*value).to_string());
    }
    raw
}

/// Parse a `YYYY-MM-DD` date
#[must_use]
pub fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

/// A normalized standalone local identity
#[must_use]
pub fn local(identity_id: u64, first: &str, last: &str, dob: &str) -> LocalIdentity {
    LocalIdentity::new(identity_id, PersonKey::new(first, last, Some(date(dob))))
}

/// A normalized adult remote record
#[must_use]
pub fn remote(record_id: &str, first: &str, last: &str, dob: &str) -> RemoteRecord {
    RemoteRecord::new(record_id, PersonKey::new(first, last, Some(date(dob))), 40)
}
