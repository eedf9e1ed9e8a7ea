//! Flat output tables for mappings and duplicate reports

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{TableFormat, read_rows, write_rows};
use crate::algorithm::matching::{AssignedRow, MatchOutcome, NameMismatch};
use crate::models::{
    ClusterResolution, DuplicateReport, IdentityId, LocalIdentity, Mapping, MappingEntry,
    ResolutionReason, SupersededEntry,
};
use crate::normalize::clean_text;

/// One row of the current mapping output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRow {
    pub remote_record_id: String,
    pub identity_id: IdentityId,
    pub stage: String,
}

impl From<&MappingEntry> for MappingRow {
    fn from(entry: &MappingEntry) -> Self {
        Self {
            remote_record_id: entry.remote_record_id.clone(),
            identity_id: entry.identity_id,
            stage: entry.stage.to_string(),
        }
    }
}

/// One row of the superseded registrations output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupersededRow {
    pub remote_record_id: String,
    pub identity_id: IdentityId,
    pub kept_remote_record_id: String,
}

impl From<&SupersededEntry> for SupersededRow {
    fn from(entry: &SupersededEntry) -> Self {
        Self {
            remote_record_id: entry.remote_record_id.clone(),
            identity_id: entry.identity_id,
            kept_remote_record_id: entry.kept.clone(),
        }
    }
}

/// A carried-forward remote record that left the remote registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawnRow {
    pub remote_record_id: String,
}

/// One row of the name mismatch output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MismatchRow {
    pub remote_record_id: String,
    pub identity_id: IdentityId,
    pub local_first: String,
    pub local_last: String,
    pub remote_first: String,
    pub remote_last: String,
}

impl From<&NameMismatch> for MismatchRow {
    fn from(mismatch: &NameMismatch) -> Self {
        Self {
            remote_record_id: mismatch.remote_record_id.clone(),
            identity_id: mismatch.identity_id,
            local_first: mismatch.local_first.clone(),
            local_last: mismatch.local_last.clone(),
            remote_first: mismatch.remote_first.clone(),
            remote_last: mismatch.remote_last.clone(),
        }
    }
}

/// One physical remote row scheduled for a push, with its batch number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushBatchRow {
    pub batch: usize,
    pub identity_id: IdentityId,
    pub remote_record_id: String,
    pub position: usize,
}

impl PushBatchRow {
    /// Flatten identity batches into one table, batches numbered from zero
    #[must_use]
    pub fn from_batches(batches: &[Vec<&AssignedRow<'_>>]) -> Vec<Self> {
        batches
            .iter()
            .enumerate()
            .flat_map(|(batch, rows)| {
                rows.iter().map(move |assigned| Self {
                    batch,
                    identity_id: assigned.identity_id,
                    remote_record_id: assigned.remote_record_id.clone(),
                    position: assigned.position,
                })
            })
            .collect()
    }
}

/// One clustered identity in a duplicate output table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateRow {
    pub identity_id: IdentityId,
    pub first: String,
    pub last: String,
    pub dob: String,
    pub remote_record_id: String,
    pub reason: String,
    pub action: String,
}

impl DuplicateRow {
    fn new(identity: &LocalIdentity, resolution: &ClusterResolution, action: &str) -> Self {
        Self {
            identity_id: identity.identity_id,
            first: resolution.key.first.clone(),
            last: resolution.key.last.clone(),
            dob: resolution.key.dob.format("%Y-%m-%d").to_string(),
            remote_record_id: identity.remote_record_id.clone(),
            reason: resolution.reason.to_string(),
            action: action.to_string(),
        }
    }
}

/// Flattened duplicate tables, one per named list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateTables {
    pub remote_linked: Vec<DuplicateRow>,
    pub declined: Vec<DuplicateRow>,
    pub to_delete: Vec<DuplicateRow>,
    pub not_to_delete: Vec<DuplicateRow>,
}

impl DuplicateTables {
    /// Flatten a report, looking up remote links on the identities
    #[must_use]
    pub fn from_report(report: &DuplicateReport, identities: &[LocalIdentity]) -> Self {
        let by_id = crate::algorithm::duplicates::index_identities(identities);
        let mut tables = Self::default();

        for resolution in &report.resolutions {
            let rows = |ids: &[IdentityId], action: &str| -> Vec<DuplicateRow> {
                ids.iter()
                    .filter_map(|identity_id| by_id.get(identity_id))
                    .map(|identity| DuplicateRow::new(identity, resolution, action))
                    .collect()
            };
            let review = rows(&resolution.review, "review");
            let retained = rows(&resolution.retained, "keep");

            match resolution.reason {
                ResolutionReason::RemoteLinked => {
                    tables.remote_linked.extend(review.iter().cloned());
                }
                ResolutionReason::Declined => {
                    tables.declined.extend(review.iter().cloned());
                }
                ResolutionReason::MostRecent => {}
            }
            tables.to_delete.extend(rows(&resolution.deleted, "delete"));
            tables.not_to_delete.extend(retained);
            tables.not_to_delete.extend(review);
        }
        tables
    }
}

fn output_path(prefix: &Path, suffix: &str, format: TableFormat) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(format!("_{suffix}.{}", format.extension()));
    PathBuf::from(name)
}

/// Write the mapping, superseded, withdrawn and name mismatch outputs of a matching run
pub fn write_match_outputs(
    prefix: &Path,
    format: TableFormat,
    outcome: &MatchOutcome,
    mismatches: &[NameMismatch],
) -> anyhow::Result<Vec<PathBuf>> {
    let mapping: Vec<MappingRow> = outcome.mapping.entries().iter().map(MappingRow::from).collect();
    let superseded: Vec<SupersededRow> = outcome.superseded.iter().map(SupersededRow::from).collect();
    let withdrawn: Vec<WithdrawnRow> = outcome
        .withdrawn
        .iter()
        .map(|remote_record_id| WithdrawnRow {
            remote_record_id: remote_record_id.clone(),
        })
        .collect();
    let mismatches: Vec<MismatchRow> = mismatches.iter().map(MismatchRow::from).collect();

    let mut written = Vec::new();
    let path = output_path(prefix, "current_mapping", format);
    write_rows(&path, &mapping, format)?;
    written.push(path);

    let path = output_path(prefix, "superseded", format);
    write_rows(&path, &superseded, format)?;
    written.push(path);

    let path = output_path(prefix, "withdrawn", format);
    write_rows(&path, &withdrawn, format)?;
    written.push(path);

    let path = output_path(prefix, "name_mismatch", format);
    write_rows(&path, &mismatches, format)?;
    written.push(path);

    Ok(written)
}

/// Write the push batch plan, one row per assigned remote row
pub fn write_push_batches(
    prefix: &Path,
    format: TableFormat,
    batches: &[Vec<&AssignedRow<'_>>],
) -> anyhow::Result<PathBuf> {
    let rows = PushBatchRow::from_batches(batches);
    let path = output_path(prefix, "push_batches", format);
    write_rows(&path, &rows, format)?;
    Ok(path)
}

/// Write the four duplicate tables
pub fn write_duplicate_outputs(
    prefix: &Path,
    format: TableFormat,
    tables: &DuplicateTables,
) -> anyhow::Result<Vec<PathBuf>> {
    let outputs = [
        ("remote_linked", &tables.remote_linked),
        ("declined", &tables.declined),
        ("to_delete", &tables.to_delete),
        ("not_to_delete", &tables.not_to_delete),
    ];

    let mut written = Vec::with_capacity(outputs.len());
    for (suffix, rows) in outputs {
        let path = output_path(prefix, suffix, format);
        write_rows(&path, rows, format)?;
        written.push(path);
    }
    Ok(written)
}

/// Load a mapping written by an earlier run.
///
/// Only `remote_record_id` and `identity_id` are read; rows with an empty
/// remote record id are skipped.
pub fn load_previous_mapping(path: &Path, missing_sentinel: &str) -> anyhow::Result<Mapping> {
    let rows = read_rows(path)?;
    let mut pairs = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let remote_record_id = clean_text(
            row.get("remote_record_id").map_or("", String::as_str),
            missing_sentinel,
        );
        if remote_record_id.is_empty() {
            continue;
        }
        let raw_id = row.get("identity_id").map_or("", |value| value.trim());
        let identity_id: IdentityId = raw_id.parse().with_context(|| {
            format!(
                "Invalid identity_id '{raw_id}' in row {index} of {}",
                path.display()
            )
        })?;
        pairs.push((remote_record_id, identity_id));
    }

    Ok(Mapping::from_pairs(pairs))
}
