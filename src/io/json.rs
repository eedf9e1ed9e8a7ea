//! JSON registry exports
//!
//! Registry APIs hand out record exports as a JSON array of flat objects.
//! Values of any scalar type are rendered back to strings so the normalizer
//! sees the same text a CSV export would carry.

use anyhow::{Context, bail};
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Instant;

use crate::models::RawRow;
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Read a JSON array of flat objects into raw rows
pub fn read_json_rows(path: &Path) -> anyhow::Result<Vec<RawRow>> {
    let start = Instant::now();
    log_operation_start("Reading JSON file", path);

    let file = File::open(path)
        .with_context(|| format!("Failed to open JSON file: {}", path.display()))?;
    let value: Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse JSON file: {}", path.display()))?;
    let rows = rows_from_value(value)
        .with_context(|| format!("Unexpected JSON layout in {}", path.display()))?;

    log_operation_complete("read", path, rows.len(), Some(start.elapsed()));
    Ok(rows)
}

/// Convert a parsed JSON document into raw rows
pub fn rows_from_value(value: Value) -> anyhow::Result<Vec<RawRow>> {
    let Value::Array(records) = value else {
        bail!("expected an array of records");
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| match record {
            Value::Object(fields) => Ok(fields
                .into_iter()
                .map(|(column, value)| (column, render_value(&value)))
                .collect()),
            other => bail!("record {index} is not an object: {other}"),
        })
        .collect()
}

/// Render a JSON value as registry text; null becomes the empty string
fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Number(number) => match (number.as_i64(), number.as_f64()) {
            (Some(integer), _) => integer.to_string(),
            (None, Some(float)) if float.fract() == 0.0 && float.abs() < 1e15 => {
                format!("{float:.0}")
            }
            _ => number.to_string(),
        },
        other => other.to_string(),
    }
}

/// Write rows as a pretty-printed JSON array
pub fn write_json<T: Serialize>(path: &Path, rows: &[T]) -> anyhow::Result<()> {
    let start = Instant::now();
    log_operation_start("Writing JSON file", path);

    let file = File::create(path)
        .with_context(|| format!("Failed to create JSON file: {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), rows)
        .with_context(|| format!("Failed to write JSON file: {}", path.display()))?;

    log_operation_complete("wrote", path, rows.len(), Some(start.elapsed()));
    Ok(())
}
