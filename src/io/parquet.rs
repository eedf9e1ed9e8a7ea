//! Parquet registry snapshots and outputs

use anyhow::Context;
use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, FieldRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::{Deserialize, Serialize};
use serde_arrow::schema::{SchemaLike, TracingOptions};
use std::fs::File;
use std::path::Path;
use std::time::Instant;

use crate::models::RawRow;
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Read a parquet file into Arrow record batches
pub fn read_parquet(path: &Path) -> anyhow::Result<Vec<RecordBatch>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open parquet file: {}", path.display()))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("Failed to read parquet file: {}", path.display()))?
        .build()
        .with_context(|| format!("Failed to build parquet reader for {}", path.display()))?;

    reader
        .map(|batch| batch.with_context(|| format!("Failed to read record batch from {}", path.display())))
        .collect()
}

/// Read a parquet file into raw rows, rendering every column as text
pub fn read_parquet_rows(path: &Path) -> anyhow::Result<Vec<RawRow>> {
    let start = Instant::now();
    log_operation_start("Reading parquet file", path);

    let mut rows = Vec::new();
    for batch in read_parquet(path)? {
        rows.extend(batch_to_rows(&batch)?);
    }

    log_operation_complete("read", path, rows.len(), Some(start.elapsed()));
    Ok(rows)
}

/// Convert one record batch into raw rows; nulls become the empty string
pub fn batch_to_rows(batch: &RecordBatch) -> anyhow::Result<Vec<RawRow>> {
    let schema = batch.schema();
    let mut rows = vec![RawRow::new(); batch.num_rows()];

    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        let text = cast(column, &DataType::Utf8)
            .with_context(|| format!("Column '{}' cannot be rendered as text", field.name()))?;
        let text = text.as_string::<i32>();

        for (index, row) in rows.iter_mut().enumerate() {
            let value = if text.is_null(index) {
                String::new()
            } else {
                render_cell(field.data_type(), text.value(index))
            };
            row.insert(field.name().clone(), value);
        }
    }

    Ok(rows)
}

/// Undo Arrow's text rendering where it differs from registry exports
fn render_cell(data_type: &DataType, value: &str) -> String {
    match data_type {
        DataType::Timestamp(_, _) | DataType::Date64 => value.replacen('T', " ", 1),
        DataType::Float16 | DataType::Float32 | DataType::Float64 => value
            .strip_suffix(".0")
            .unwrap_or(value)
            .to_string(),
        _ => value.to_string(),
    }
}

/// Serialize rows into a record batch with a schema traced from `T`
pub fn to_record_batch<T>(rows: &[T]) -> anyhow::Result<RecordBatch>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let fields = Vec::<FieldRef>::from_type::<T>(TracingOptions::default())
        .map_err(|e| anyhow::anyhow!("Schema generation error: {e}"))?;
    serde_arrow::to_record_batch(&fields, &rows)
        .map_err(|e| anyhow::anyhow!("Serialization error: {e}"))
}

/// Write rows to a parquet file
pub fn write_parquet<T>(path: &Path, rows: &[T]) -> anyhow::Result<()>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let start = Instant::now();
    log_operation_start("Writing parquet file", path);

    let batch = to_record_batch(rows)?;
    let file = File::create(path)
        .with_context(|| format!("Failed to create parquet file: {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
        .with_context(|| format!("Failed to create parquet writer for {}", path.display()))?;
    writer
        .write(&batch)
        .with_context(|| format!("Failed to write parquet file: {}", path.display()))?;
    writer
        .close()
        .with_context(|| format!("Failed to finish parquet file: {}", path.display()))?;

    log_operation_complete("wrote", path, rows.len(), Some(start.elapsed()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
    use std::sync::Arc;

    #[test]
    fn test_batch_columns_become_text() {
        let ids: ArrayRef = Arc::new(Int64Array::from(vec![Some(3), None]));
        let names: ArrayRef = Arc::new(StringArray::from(vec![Some("Amy"), Some("nan")]));
        let ages: ArrayRef = Arc::new(Float64Array::from(vec![Some(34.0), Some(2.5)]));
        let batch = RecordBatch::try_from_iter(vec![
            ("identity_id", ids),
            ("first_local", names),
            ("age", ages),
        ])
        .unwrap();

        let rows = batch_to_rows(&batch).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["identity_id"], "3");
        assert_eq!(rows[1]["identity_id"], "");
        assert_eq!(rows[1]["first_local"], "nan");
        assert_eq!(rows[0]["age"], "34");
        assert_eq!(rows[1]["age"], "2.5");
    }
}
