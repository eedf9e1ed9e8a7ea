//! Remote record model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::types::PersonKey;

/// The primary (non-repeat) row of one record in the remote registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// Registry-assigned record identifier
    pub remote_record_id: String,
    /// The primary subject
    pub subject: PersonKey,
    /// Subject age; the configured unknown-age sentinel when not recorded
    pub age: i32,
    /// The dependent, empty when the record is about an adult
    pub dependent: PersonKey,
    /// Laboratory identifier, may be empty
    pub external_lab_id: String,
    /// Last modification in the remote registry
    pub last_update_timestamp: Option<NaiveDateTime>,
}

impl RemoteRecord {
    /// Create a remote record for an adult subject
    #[must_use]
    pub fn new(remote_record_id: impl Into<String>, subject: PersonKey, age: i32) -> Self {
        Self {
            remote_record_id: remote_record_id.into(),
            subject,
            age,
            dependent: PersonKey::default(),
            external_lab_id: String::new(),
            last_update_timestamp: None,
        }
    }

    /// Set the dependent
    #[must_use]
    pub fn with_dependent(mut self, dependent: PersonKey) -> Self {
        self.dependent = dependent;
        self
    }

    /// Set the laboratory identifier
    #[must_use]
    pub fn with_lab_id(mut self, lab_id: impl Into<String>) -> Self {
        self.external_lab_id = lab_id.into();
        self
    }

    /// Set the last update timestamp
    #[must_use]
    pub fn with_last_update(mut self, timestamp: NaiveDateTime) -> Self {
        self.last_update_timestamp = Some(timestamp);
        self
    }

    /// Whether the record is matched on the subject rather than the dependent
    #[must_use]
    pub const fn is_adult(&self, adult_age: i32) -> bool {
        self.age >= adult_age
    }
}
