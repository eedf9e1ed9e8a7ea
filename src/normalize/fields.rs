//! Canonical field names and registry column profiles
//!
//! Registries export the same concepts under their own column names. A
//! `FieldProfile` maps each canonical field to the column that carries it, so
//! the normalizer only ever speaks canonical names.

use rustc_hash::FxHashMap;

use crate::models::RawRow;

pub const IDENTITY_ID: &str = "identity_id";
pub const REMOTE_RECORD_ID: &str = "remote_record_id";
pub const SUBJECT_FIRST: &str = "subject_first";
pub const SUBJECT_LAST: &str = "subject_last";
pub const SUBJECT_DOB: &str = "subject_dob";
pub const DEPENDENT_FIRST: &str = "dependent_first";
pub const DEPENDENT_LAST: &str = "dependent_last";
pub const DEPENDENT_DOB: &str = "dependent_dob";
pub const EXTERNAL_LAB_ID: &str = "external_lab_id";
pub const DECLINE_1: &str = "decline_1";
pub const DECLINE_2: &str = "decline_2";
pub const DECLINE_3: &str = "decline_3";
pub const AGE: &str = "age";
pub const LAST_UPDATE_TIMESTAMP: &str = "last_update_timestamp";
pub const REPEAT_INSTRUMENT_NAME: &str = "repeat_instrument_name";

/// Fields every local identity row must carry
pub const LOCAL_FIELDS: [&str; 12] = [
    IDENTITY_ID,
    REMOTE_RECORD_ID,
    SUBJECT_FIRST,
    SUBJECT_LAST,
    SUBJECT_DOB,
    DEPENDENT_FIRST,
    DEPENDENT_LAST,
    DEPENDENT_DOB,
    EXTERNAL_LAB_ID,
    DECLINE_1,
    DECLINE_2,
    DECLINE_3,
];

/// Fields every remote record row must carry
pub const REMOTE_FIELDS: [&str; 10] = [
    REMOTE_RECORD_ID,
    SUBJECT_FIRST,
    SUBJECT_LAST,
    SUBJECT_DOB,
    AGE,
    DEPENDENT_FIRST,
    DEPENDENT_LAST,
    DEPENDENT_DOB,
    EXTERNAL_LAB_ID,
    LAST_UPDATE_TIMESTAMP,
];

/// Remote fields that may be absent; a missing repeat instrument marks a primary row
pub const REMOTE_OPTIONAL_FIELDS: [&str; 1] = [REPEAT_INSTRUMENT_NAME];

/// Mapping from canonical field names to registry column names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldProfile {
    columns: FxHashMap<&'static str, String>,
}

impl FieldProfile {
    /// Profile whose columns carry the canonical names
    #[must_use]
    pub fn canonical() -> Self {
        Self::default()
    }

    /// Column names of the local REDCap project export
    #[must_use]
    pub fn redcap_local() -> Self {
        Self::canonical()
            .with_column(IDENTITY_ID, "cuimc_id")
            .with_column(REMOTE_RECORD_ID, "record_id")
            .with_column(SUBJECT_FIRST, "first_local")
            .with_column(SUBJECT_LAST, "last_local")
            .with_column(SUBJECT_DOB, "dob")
            .with_column(DEPENDENT_FIRST, "child_first")
            .with_column(DEPENDENT_LAST, "last_child")
            .with_column(DEPENDENT_DOB, "dob_child")
            .with_column(EXTERNAL_LAB_ID, "participant_lab_id")
            .with_column(DECLINE_1, "rec_outcome")
            .with_column(DECLINE_2, "rec_outcome_2")
            .with_column(DECLINE_3, "rec_outcome_3")
    }

    /// Column names of the remote REDCap project export
    #[must_use]
    pub fn redcap_remote() -> Self {
        Self::canonical()
            .with_column(REMOTE_RECORD_ID, "record_id")
            .with_column(SUBJECT_FIRST, "first_name")
            .with_column(SUBJECT_LAST, "last_name")
            .with_column(SUBJECT_DOB, "date_of_birth")
            .with_column(DEPENDENT_FIRST, "first_name_child")
            .with_column(DEPENDENT_LAST, "last_name_child")
            .with_column(DEPENDENT_DOB, "date_of_birth_child")
            .with_column(EXTERNAL_LAB_ID, "participant_lab_id")
            .with_column(REPEAT_INSTRUMENT_NAME, "redcap_repeat_instrument")
    }

    /// Map a canonical field to a registry column
    #[must_use]
    pub fn with_column(mut self, field: &'static str, column: impl Into<String>) -> Self {
        self.columns.insert(field, column.into());
        self
    }

    /// Column carrying `field`
    #[must_use]
    pub fn column<'a>(&'a self, field: &'a str) -> &'a str {
        self.columns.get(field).map_or(field, String::as_str)
    }

    /// Raw value of `field` in `row`, `None` when the column is absent
    #[must_use]
    pub fn value<'r>(&self, row: &'r RawRow, field: &str) -> Option<&'r str> {
        row.get(self.column(field)).map(String::as_str)
    }

    /// Columns of `row` that none of `fields` maps to
    #[must_use]
    pub fn unknown_columns<'r>(&self, row: &'r RawRow, fields: &[&str]) -> Vec<&'r str> {
        row.keys()
            .map(String::as_str)
            .filter(|column| !fields.iter().any(|field| self.column(field) == *column))
            .collect()
    }
}
