//! Utilities for working with Arrow arrays.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, StringArray};
use arrow::compute::kernels::cast::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

use crate::error::{PrepError, Result};

/// Get a string column from a record batch by name
///
/// # Arguments
///
/// * `batch` - The record batch containing the column
/// * `table` - Name of the source table, for error messages
/// * `column_name` - The name of the column to extract
///
/// # Errors
///
/// Returns `MissingColumn` if the batch has no such column, and an Arrow
/// error if the column is not Utf8.
pub fn string_column<'a>(
    batch: &'a RecordBatch,
    table: &str,
    column_name: &str,
) -> Result<&'a StringArray> {
    let idx = batch
        .schema()
        .index_of(column_name)
        .map_err(|_| PrepError::missing_column(table, column_name))?;

    batch
        .column(idx)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| {
            PrepError::Arrow(ArrowError::CastError(format!(
                "Column {column_name} of {table} is {:?}, expected Utf8",
                batch.column(idx).data_type()
            )))
        })
}

/// Cast every column of `batch` to nullable Utf8
///
/// Values keep the textual form Arrow's cast kernel gives them, so parquet
/// inputs go through the same parsing path as CSV inputs.
pub fn cast_columns_to_utf8(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    if schema
        .fields()
        .iter()
        .all(|field| field.data_type() == &DataType::Utf8)
    {
        return Ok(batch.clone());
    }

    let columns = batch
        .columns()
        .iter()
        .map(|column| cast(column, &DataType::Utf8))
        .collect::<std::result::Result<Vec<ArrayRef>, ArrowError>>()?;

    let fields = schema
        .fields()
        .iter()
        .map(|field| Field::new(field.name(), DataType::Utf8, true))
        .collect::<Vec<_>>();

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}
