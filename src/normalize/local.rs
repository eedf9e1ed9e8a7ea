//! Local identity normalization.

use log::debug;
use rustc_hash::FxHashSet;
use std::time::Instant;

use super::RowFields;
use super::fields::{
    DECLINE_1, DECLINE_2, DECLINE_3, DEPENDENT_DOB, DEPENDENT_FIRST, DEPENDENT_LAST,
    EXTERNAL_LAB_ID, FieldProfile, IDENTITY_ID, LOCAL_FIELDS, REMOTE_RECORD_ID, SUBJECT_DOB,
    SUBJECT_FIRST, SUBJECT_LAST,
};
use crate::config::ReconcileConfig;
use crate::error::Result;
use crate::models::{DeclineFlags, IdentityId, LocalIdentity, RawRow};
use crate::utils::logging::{log_stage_complete, log_stage_start};

const TABLE: &str = "local";

/// Normalize local rows; the first row of a repeated identity id wins
pub fn normalize_local_rows(
    rows: &[RawRow],
    profile: &FieldProfile,
    config: &ReconcileConfig,
) -> Result<Vec<LocalIdentity>> {
    let start = Instant::now();
    log_stage_start("Normalizing local identities");

    let mut seen: FxHashSet<IdentityId> = FxHashSet::default();
    let mut identities = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let fields = RowFields::new(row, profile, config, TABLE, index);
        fields.check_columns(&LOCAL_FIELDS, &[])?;

        let identity_id = parse_identity_id(&fields)?;
        if !seen.insert(identity_id) {
            debug!("Skipping repeated local row {index} for identity {identity_id}");
            continue;
        }

        identities.push(LocalIdentity {
            identity_id,
            remote_record_id: fields.text(REMOTE_RECORD_ID)?,
            subject: fields.person(SUBJECT_FIRST, SUBJECT_LAST, SUBJECT_DOB)?,
            dependent: fields.person(DEPENDENT_FIRST, DEPENDENT_LAST, DEPENDENT_DOB)?,
            external_lab_id: fields.text(EXTERNAL_LAB_ID)?,
            decline_flags: DeclineFlags::new(
                fields.text(DECLINE_1)?,
                fields.text(DECLINE_2)?,
                fields.text(DECLINE_3)?,
            ),
        });
    }

    log_stage_complete("normalized local identities", identities.len(), Some(start.elapsed()));
    Ok(identities)
}

fn parse_identity_id(fields: &RowFields<'_>) -> Result<IdentityId> {
    let value = fields.text(IDENTITY_ID)?;
    value
        .parse::<IdentityId>()
        .map_err(|e| fields.malformed(IDENTITY_ID, format!("'{value}' is not a non-negative integer: {e}")))
}
