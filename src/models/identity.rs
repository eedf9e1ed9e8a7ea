//! Local identity model
//!
//! A local identity is one row of the local registry. It stands for a single
//! participant, or for a parent/dependent pair when the dependent fields are
//! filled in.

use serde::{Deserialize, Serialize};

use super::types::{DeclineFlags, IdentityId, PersonKey};

/// One locally issued identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalIdentity {
    /// Immutable identity number
    pub identity_id: IdentityId,
    /// Linked remote record, empty when not yet linked
    pub remote_record_id: String,
    /// The primary subject
    pub subject: PersonKey,
    /// The dependent, empty for standalone subjects
    pub dependent: PersonKey,
    /// Laboratory identifier, may be empty
    pub external_lab_id: String,
    /// Recruitment outcome codes
    pub decline_flags: DeclineFlags,
}

impl LocalIdentity {
    /// Create an unlinked identity for a standalone subject
    #[must_use]
    pub fn new(identity_id: IdentityId, subject: PersonKey) -> Self {
        Self {
            identity_id,
            remote_record_id: String::new(),
            subject,
            dependent: PersonKey::default(),
            external_lab_id: String::new(),
            decline_flags: DeclineFlags::default(),
        }
    }

    /// Set the dependent of this identity
    #[must_use]
    pub fn with_dependent(mut self, dependent: PersonKey) -> Self {
        self.dependent = dependent;
        self
    }

    /// Set the linked remote record
    #[must_use]
    pub fn with_remote_record(mut self, remote_record_id: impl Into<String>) -> Self {
        self.remote_record_id = remote_record_id.into();
        self
    }

    /// Set the laboratory identifier
    #[must_use]
    pub fn with_lab_id(mut self, lab_id: impl Into<String>) -> Self {
        self.external_lab_id = lab_id.into();
        self
    }

    /// Set the decline flags
    #[must_use]
    pub fn with_decline_flags(mut self, flags: DeclineFlags) -> Self {
        self.decline_flags = flags;
        self
    }

    /// Whether this identity was created for a dependent.
    ///
    /// The dependent component counts as present when the dependent first
    /// name carries at least one letter.
    #[must_use]
    pub fn has_dependent(&self) -> bool {
        self.dependent.first.chars().any(char::is_alphabetic)
    }

    /// Whether this identity is already linked to a remote record
    #[must_use]
    pub fn is_linked(&self) -> bool {
        !self.remote_record_id.is_empty()
    }

    /// Whether any outcome code marks the subject as declined
    #[must_use]
    pub fn has_declined(&self, decline_code: &str) -> bool {
        self.decline_flags.contains(decline_code)
    }
}
