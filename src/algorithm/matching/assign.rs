//! Assignment of physical remote rows to identities
//!
//! Pushing remote data into the local registry sends every physical row,
//! repeat-instrument rows included. Rows of one identity must travel in the
//! same batch: a later batch for the same identity overwrites what an earlier
//! one wrote.

use log::debug;

use crate::config::ReconcileConfig;
use crate::models::{IdentityId, Mapping, RawRow, batch_by_identity};
use crate::normalize::fields::{FieldProfile, REMOTE_RECORD_ID};
use crate::normalize::clean_text;

/// A raw remote row together with the identity it resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedRow<'r> {
    /// Identity of the row's remote record
    pub identity_id: IdentityId,
    /// Normalized remote record id of the row
    pub remote_record_id: String,
    /// Position of the row in the remote snapshot
    pub position: usize,
    /// The untouched registry row
    pub row: &'r RawRow,
}

/// Attach identities to raw remote rows, in input order.
///
/// Rows whose remote record is not in the mapping (superseded registrations)
/// are left out.
#[must_use]
pub fn assign_rows<'r>(
    mapping: &Mapping,
    rows: &'r [RawRow],
    profile: &FieldProfile,
    config: &ReconcileConfig,
) -> Vec<AssignedRow<'r>> {
    let lookup = mapping.lookup();
    let column = profile.column(REMOTE_RECORD_ID);

    let assigned: Vec<AssignedRow<'r>> = rows
        .iter()
        .enumerate()
        .filter_map(|(position, row)| {
            let remote_record_id = clean_text(row.get(column)?, &config.missing_sentinel);
            let identity_id = *lookup.get(remote_record_id.as_str())?;
            Some(AssignedRow {
                identity_id,
                remote_record_id,
                position,
                row,
            })
        })
        .collect();

    debug!(
        "Assigned {} of {} remote rows to identities",
        assigned.len(),
        rows.len()
    );
    assigned
}

/// Split assigned rows into batches of at most `batch_size` identities
#[must_use]
pub fn identity_batches<'a, 'r>(
    rows: &'a [AssignedRow<'r>],
    batch_size: usize,
) -> Vec<Vec<&'a AssignedRow<'r>>> {
    batch_by_identity(rows, |assigned| assigned.identity_id, batch_size)
}
