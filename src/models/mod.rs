//! Domain models for identity reconciliation
//!
//! Typed tables produced by the normalizer and the outputs of the matcher and
//! the duplicate pass.

pub mod duplicate;
pub mod identity;
pub mod mapping;
pub mod remote;
pub mod types;

// Re-export commonly used types
pub use duplicate::{ClusterKey, ClusterResolution, DuplicateCluster, DuplicateReport, ResolutionReason};
pub use identity::LocalIdentity;
pub use mapping::{Mapping, MappingEntry, MatchStage, SupersededEntry, batch_by_identity};
pub use remote::RemoteRecord;
pub use types::{DeclineFlags, IdentityId, PersonKey, RawRow};
