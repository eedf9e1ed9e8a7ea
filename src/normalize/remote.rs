//! Remote record normalization
//!
//! A remote record can span several physical rows: one primary row plus any
//! number of repeat-instrument rows sharing the record id. Only the first
//! primary row of each record id is kept; a record id seen only on repeat rows
//! falls back to its first row.

use log::debug;
use rustc_hash::FxHashMap;
use std::time::Instant;

use super::RowFields;
use super::dates::parse_optional_timestamp;
use super::fields::{
    AGE, DEPENDENT_DOB, DEPENDENT_FIRST, DEPENDENT_LAST, EXTERNAL_LAB_ID, FieldProfile,
    LAST_UPDATE_TIMESTAMP, REMOTE_FIELDS, REMOTE_OPTIONAL_FIELDS, REMOTE_RECORD_ID,
    REPEAT_INSTRUMENT_NAME, SUBJECT_DOB, SUBJECT_FIRST, SUBJECT_LAST,
};
use crate::config::ReconcileConfig;
use crate::error::Result;
use crate::models::{RawRow, RemoteRecord};
use crate::utils::logging::{log_stage_complete, log_stage_start};

const TABLE: &str = "remote";

/// Row chosen to represent one remote record id
#[derive(Debug, Clone, Copy)]
struct PrimaryRow {
    index: usize,
    is_repeat: bool,
}

/// Normalize remote rows into one record per remote record id, in first-seen order
pub fn normalize_remote_rows(
    rows: &[RawRow],
    profile: &FieldProfile,
    config: &ReconcileConfig,
) -> Result<Vec<RemoteRecord>> {
    let start = Instant::now();
    log_stage_start("Normalizing remote records");

    let mut slots: FxHashMap<String, usize> = FxHashMap::default();
    let mut primary: Vec<PrimaryRow> = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let fields = RowFields::new(row, profile, config, TABLE, index);
        fields.check_columns(&REMOTE_FIELDS, &REMOTE_OPTIONAL_FIELDS)?;

        let remote_record_id = fields.text(REMOTE_RECORD_ID)?;
        if remote_record_id.is_empty() {
            return Err(fields.malformed(REMOTE_RECORD_ID, "empty record id"));
        }
        let is_repeat = !fields.optional_text(REPEAT_INSTRUMENT_NAME).is_empty();

        match slots.get(&remote_record_id) {
            None => {
                slots.insert(remote_record_id, primary.len());
                primary.push(PrimaryRow { index, is_repeat });
            }
            Some(&slot) => {
                if primary[slot].is_repeat && !is_repeat {
                    primary[slot] = PrimaryRow { index, is_repeat };
                }
            }
        }
    }

    debug!(
        "Collapsed {} remote rows into {} remote records",
        rows.len(),
        primary.len()
    );

    let records = primary
        .iter()
        .map(|chosen| {
            let fields = RowFields::new(&rows[chosen.index], profile, config, TABLE, chosen.index);
            parse_record(&fields)
        })
        .collect::<Result<Vec<_>>>()?;

    log_stage_complete("normalized remote records", records.len(), Some(start.elapsed()));
    Ok(records)
}

fn parse_record(fields: &RowFields<'_>) -> Result<RemoteRecord> {
    let timestamp = fields.text(LAST_UPDATE_TIMESTAMP)?;
    let last_update_timestamp =
        parse_optional_timestamp(&timestamp, &fields.config().timestamp_format).map_err(|e| {
            fields.malformed(LAST_UPDATE_TIMESTAMP, format!("'{timestamp}' is not a timestamp: {e}"))
        })?;

    Ok(RemoteRecord {
        remote_record_id: fields.text(REMOTE_RECORD_ID)?,
        subject: fields.person(SUBJECT_FIRST, SUBJECT_LAST, SUBJECT_DOB)?,
        age: parse_age(fields)?,
        dependent: fields.person(DEPENDENT_FIRST, DEPENDENT_LAST, DEPENDENT_DOB)?,
        external_lab_id: fields.text(EXTERNAL_LAB_ID)?,
        last_update_timestamp,
    })
}

/// Empty ages map to the unknown-age sentinel so the record is matched as an adult
fn parse_age(fields: &RowFields<'_>) -> Result<i32> {
    let value = fields.text(AGE)?;
    if value.is_empty() {
        return Ok(fields.config().unknown_age);
    }
    value
        .parse::<i32>()
        .map_err(|e| fields.malformed(AGE, format!("'{value}' is not an integer: {e}")))
}
