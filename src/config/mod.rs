//! Configuration for identity reconciliation.

use serde::Deserialize;

use crate::normalize::dates::DateFormatConfig;

/// Configuration shared by the normalizer, the matcher and the duplicate resolver
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Remote records with an age at or above this value are matched as adults
    pub adult_age: i32,
    /// Age assigned to remote records with an empty age field
    pub unknown_age: i32,
    /// Outcome code that marks a subject as having declined to participate
    pub decline_code: String,
    /// Literal that upstream systems emit for missing values
    pub missing_sentinel: String,
    /// Date formats tried when parsing dates of birth
    pub date_formats: DateFormatConfig,
    /// Format of `last_update_timestamp`
    pub timestamp_format: String,
    /// Reject rows carrying columns that the field profile does not know
    pub strict_fields: bool,
    /// Carry forward links already stored on local identities
    pub carry_forward_local_links: bool,
    /// Number of distinct identities per downstream batch
    pub batch_size: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            adult_age: 18,
            unknown_age: 999,
            decline_code: "9".to_string(),
            missing_sentinel: "nan".to_string(),
            date_formats: DateFormatConfig::default(),
            timestamp_format: "%Y-%m-%d %H:%M:%S".to_string(),
            strict_fields: false,
            carry_forward_local_links: true,
            batch_size: 500,
        }
    }
}

impl ReconcileConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new builder for constructing a configuration
    #[must_use]
    pub fn builder() -> ReconcileConfigBuilder {
        ReconcileConfigBuilder::new()
    }
}

/// Builder for constructing a reconciliation configuration
#[derive(Debug, Clone, Default)]
pub struct ReconcileConfigBuilder {
    config: ReconcileConfig,
}

impl ReconcileConfigBuilder {
    /// Create a new builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ReconcileConfig::default(),
        }
    }

    /// Set the adult age threshold
    #[must_use]
    pub const fn adult_age(mut self, age: i32) -> Self {
        self.config.adult_age = age;
        self
    }

    /// Set the age used when the remote age field is empty
    #[must_use]
    pub const fn unknown_age(mut self, age: i32) -> Self {
        self.config.unknown_age = age;
        self
    }

    /// Set the decline outcome code
    #[must_use]
    pub fn decline_code(mut self, code: impl Into<String>) -> Self {
        self.config.decline_code = code.into();
        self
    }

    /// Set the missing-value sentinel
    #[must_use]
    pub fn missing_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.config.missing_sentinel = sentinel.into();
        self
    }

    /// Set the date format configuration
    #[must_use]
    pub fn date_formats(mut self, formats: DateFormatConfig) -> Self {
        self.config.date_formats = formats;
        self
    }

    /// Set the timestamp format
    #[must_use]
    pub fn timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.config.timestamp_format = format.into();
        self
    }

    /// Set whether unknown columns are rejected
    #[must_use]
    pub const fn strict_fields(mut self, strict: bool) -> Self {
        self.config.strict_fields = strict;
        self
    }

    /// Set whether local identity links are carried forward
    #[must_use]
    pub const fn carry_forward_local_links(mut self, enabled: bool) -> Self {
        self.config.carry_forward_local_links = enabled;
        self
    }

    /// Set the number of identities per downstream batch
    #[must_use]
    pub const fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> ReconcileConfig {
        self.config
    }
}
