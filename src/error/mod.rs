//! Error handling for identity reconciliation.
//!
//! Only input problems are represented here. Fetching and writing registry
//! data happens outside the core and reports its failures through `anyhow`.

use crate::models::IdentityId;

/// Errors that abort a reconciliation run
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// A row failed required-field parsing
    #[error("Malformed input in {table} row {row}, field '{field}': {message}")]
    MalformedInput {
        /// Table the row came from ("local" or "remote")
        table: &'static str,
        /// Zero-based input position of the row
        row: usize,
        /// Canonical field name
        field: String,
        /// What was wrong with the value
        message: String,
    },

    /// A duplicate cluster referenced an identity that is not in the lookup table
    #[error("Identity {0} is not present in the identity table")]
    UnknownIdentity(IdentityId),

    /// The same remote record id was passed to the matcher more than once
    #[error("Remote record '{remote_record_id}' appears at positions {first} and {second}")]
    DuplicateRemoteRecord {
        /// The repeated remote record id
        remote_record_id: String,
        /// Position of its first occurrence
        first: usize,
        /// Position of the repeat
        second: usize,
    },

    /// No identity id is left above the highest one in use
    #[error("No identity id is free above {0}")]
    IdentityExhausted(IdentityId),
}

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, ReconcileError>;
