//! Common domain type definitions
//!
//! Types shared by the local identity and remote record models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Locally issued stable identity number
pub type IdentityId = u64;

/// A registry row before normalization: column name to raw string value
pub type RawRow = BTreeMap<String, String>;

/// Name and date of birth of one person, compared after normalization
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersonKey {
    /// First name, trimmed and lower-cased
    pub first: String,
    /// Last name, trimmed and lower-cased
    pub last: String,
    /// Date of birth
    pub dob: Option<NaiveDate>,
}

impl PersonKey {
    /// Create a new person key
    #[must_use]
    pub fn new(first: impl Into<String>, last: impl Into<String>, dob: Option<NaiveDate>) -> Self {
        Self {
            first: first.into(),
            last: last.into(),
            dob,
        }
    }

    /// Whether first name, last name and date of birth are all present
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.first.is_empty() && !self.last.is_empty() && self.dob.is_some()
    }
}

/// Up to three independent recruitment outcome codes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclineFlags([String; 3]);

impl DeclineFlags {
    /// Create decline flags from the three outcome fields
    #[must_use]
    pub fn new(first: impl Into<String>, second: impl Into<String>, third: impl Into<String>) -> Self {
        Self([first.into(), second.into(), third.into()])
    }

    /// Whether any outcome equals `code`
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.0.iter().any(|flag| flag == code)
    }

    /// The raw outcome codes
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}
