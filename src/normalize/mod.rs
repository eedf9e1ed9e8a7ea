//! Normalization of raw registry rows into typed tables
//!
//! Every text value is trimmed, lower-cased and stripped of the missing-value
//! sentinel before any comparison happens. Required fields are validated here,
//! so the matcher and the duplicate pass only ever see well-formed tables.

pub mod dates;
pub mod fields;
pub mod local;
pub mod remote;
pub mod text;

use chrono::NaiveDate;
use log::warn;

use crate::config::ReconcileConfig;
use crate::error::{ReconcileError, Result};
use crate::models::{LocalIdentity, PersonKey, RawRow, RemoteRecord};

pub use dates::DateFormatConfig;
pub use fields::FieldProfile;
pub use text::clean_text;

/// Normalizer for local and remote registry rows
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: ReconcileConfig,
    local_profile: FieldProfile,
    remote_profile: FieldProfile,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(ReconcileConfig::default())
    }
}

impl Normalizer {
    /// Create a normalizer reading canonical column names
    #[must_use]
    pub fn new(config: ReconcileConfig) -> Self {
        Self {
            config,
            local_profile: FieldProfile::canonical(),
            remote_profile: FieldProfile::canonical(),
        }
    }

    /// Read local rows through `profile`
    #[must_use]
    pub fn with_local_profile(mut self, profile: FieldProfile) -> Self {
        self.local_profile = profile;
        self
    }

    /// Read remote rows through `profile`
    #[must_use]
    pub fn with_remote_profile(mut self, profile: FieldProfile) -> Self {
        self.remote_profile = profile;
        self
    }

    /// The configuration in use
    #[must_use]
    pub const fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// The profile used for remote rows
    #[must_use]
    pub const fn remote_profile(&self) -> &FieldProfile {
        &self.remote_profile
    }

    /// Normalize local registry rows into identities
    pub fn normalize_local(&self, rows: &[RawRow]) -> Result<Vec<LocalIdentity>> {
        local::normalize_local_rows(rows, &self.local_profile, &self.config)
    }

    /// Normalize remote registry rows into one record per remote record id
    pub fn normalize_remote(&self, rows: &[RawRow]) -> Result<Vec<RemoteRecord>> {
        remote::normalize_remote_rows(rows, &self.remote_profile, &self.config)
    }
}

/// Normalize local rows with canonical column names and default configuration
pub fn normalize_local(rows: &[RawRow]) -> Result<Vec<LocalIdentity>> {
    Normalizer::default().normalize_local(rows)
}

/// Normalize remote rows with canonical column names and default configuration
pub fn normalize_remote(rows: &[RawRow]) -> Result<Vec<RemoteRecord>> {
    Normalizer::default().normalize_remote(rows)
}

/// Typed access to the canonical fields of one raw row
pub(crate) struct RowFields<'r> {
    row: &'r RawRow,
    profile: &'r FieldProfile,
    config: &'r ReconcileConfig,
    table: &'static str,
    index: usize,
}

impl<'r> RowFields<'r> {
    pub(crate) const fn new(
        row: &'r RawRow,
        profile: &'r FieldProfile,
        config: &'r ReconcileConfig,
        table: &'static str,
        index: usize,
    ) -> Self {
        Self {
            row,
            profile,
            config,
            table,
            index,
        }
    }

    pub(crate) fn malformed(&self, field: &str, message: impl Into<String>) -> ReconcileError {
        ReconcileError::MalformedInput {
            table: self.table,
            row: self.index,
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Verify required columns are present; unknown columns fail in strict mode
    pub(crate) fn check_columns(&self, required: &[&str], optional: &[&str]) -> Result<()> {
        if let Some(missing) = required
            .iter()
            .find(|field| self.profile.value(self.row, field).is_none())
        {
            return Err(self.malformed(
                missing,
                format!("missing column '{}'", self.profile.column(missing)),
            ));
        }

        if self.config.strict_fields {
            let known: Vec<&str> = required.iter().chain(optional).copied().collect();
            if let Some(unknown) = self.profile.unknown_columns(self.row, &known).first() {
                return Err(self.malformed(unknown, "unknown column"));
            }
        }

        Ok(())
    }

    /// Canonicalized text of a required field
    pub(crate) fn text(&self, field: &str) -> Result<String> {
        self.profile
            .value(self.row, field)
            .map(|value| clean_text(value, &self.config.missing_sentinel))
            .ok_or_else(|| self.malformed(field, "missing value"))
    }

    /// Canonicalized text of an optional field, empty when absent
    pub(crate) fn optional_text(&self, field: &str) -> String {
        self.profile
            .value(self.row, field)
            .map(|value| clean_text(value, &self.config.missing_sentinel))
            .unwrap_or_default()
    }

    /// Date of a required field; unparseable dates are coerced to `None`
    pub(crate) fn date(&self, field: &str) -> Result<Option<NaiveDate>> {
        let value = self.text(field)?;
        match dates::parse_optional_date(&value, &self.config.date_formats) {
            Ok(date) => Ok(date),
            Err(message) => {
                warn!(
                    "{} row {}: {} in '{}', treating as empty",
                    self.table, self.index, message, field
                );
                Ok(None)
            }
        }
    }

    /// Name and date of birth assembled from three fields
    pub(crate) fn person(&self, first: &str, last: &str, dob: &str) -> Result<PersonKey> {
        Ok(PersonKey::new(self.text(first)?, self.text(last)?, self.date(dob)?))
    }

    pub(crate) const fn config(&self) -> &ReconcileConfig {
        self.config
    }
}
