//! Algorithm implementations for identity reconciliation
//!
//! This module contains the two passes run over normalized registry
//! snapshots: matching remote records to local identities, and detecting
//! and resolving duplicate identities in the local registry.

pub mod duplicates;
pub mod matching;

pub use duplicates::{DuplicateResolver, detect, find_and_resolve};
pub use matching::{MatchOutcome, MatchWarning, Matcher, match_records};
