//! Matching of remote registry records to local identities
//!
//! This module implements the rule-ordered cascade that turns two registry
//! snapshots into a mapping from remote record to identity. It includes:
//!
//! 1. Candidate indexes keyed by lab id, subject and dependent
//! 2. The matcher cascade with deterministic tie-breaking
//! 3. Identity allocation and the collapse of multi-registrations
//! 4. Helpers for downstream pushes and mismatch review

pub mod allocation;
pub mod assign;
pub mod collapse;
pub mod index;
pub mod matcher;
pub mod mismatch;
pub mod types;

// Re-export key types
pub use allocation::IdAllocator;
pub use assign::{AssignedRow, assign_rows, identity_batches};
pub use matcher::{Matcher, match_records};
pub use mismatch::{NameMismatch, name_mismatches};
pub use types::{MatchOutcome, MatchWarning};
