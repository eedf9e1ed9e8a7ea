//! Duplicate detection and resolution within the local registry
//!
//! The same adult can be registered twice under different identities. This
//! module finds such clusters and decides which identities survive.

pub mod detector;
pub mod resolver;

pub use detector::{cluster_key, detect};
pub use resolver::{DuplicateResolver, index_identities, resolve};

use crate::config::ReconcileConfig;
use crate::error::Result;
use crate::models::{DuplicateReport, LocalIdentity};

/// Detect and resolve duplicates in one pass
pub fn find_and_resolve(
    identities: &[LocalIdentity],
    config: &ReconcileConfig,
) -> Result<DuplicateReport> {
    let clusters = detect(identities);
    DuplicateResolver::new(config).resolve_all(&clusters, identities)
}
