//! A Rust library for reconciling participant identities between a local
//! registry and a remote registry, and for resolving duplicate identities
//! within the local registry.

pub mod algorithm;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod normalize;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{ReconcileConfig, ReconcileConfigBuilder};
pub use error::{ReconcileError, Result};
pub use models::{
    ClusterKey, ClusterResolution, DeclineFlags, DuplicateCluster, DuplicateReport, IdentityId,
    LocalIdentity, Mapping, MappingEntry, MatchStage, PersonKey, RawRow, RemoteRecord, ResolutionReason,
    SupersededEntry,
};

// Pipeline stages
pub use algorithm::duplicates::{DuplicateResolver, detect, find_and_resolve, resolve};
pub use algorithm::matching::{
    MatchOutcome, MatchWarning, Matcher, assign_rows, identity_batches, match_records,
    name_mismatches,
};
pub use normalize::{FieldProfile, Normalizer, normalize_local, normalize_remote};

// Input and output
pub use io::{TableFormat, load_previous_mapping, read_rows};
