//! Reading source tables into Arrow record batches
//!
//! CSV, gzip-compressed CSV and parquet inputs are supported. Every column is
//! delivered as nullable Utf8 so that downstream extraction parses values the
//! same way regardless of the input format.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use flate2::read::MultiGzDecoder;
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::util::safe_open_file;
use crate::error::{PrepError, Result};
use crate::utils::arrow::cast_columns_to_utf8;
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Default batch size for table reading
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// On-disk format of a source table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Plain CSV with a header row
    Csv,
    /// Gzip-compressed CSV with a header row
    CsvGz,
    /// Parquet file
    Parquet,
}

impl TableFormat {
    /// File name suffixes tried when resolving a table by stem, in preference order
    pub const SUFFIXES: [&'static str; 3] = [".csv.gz", ".csv", ".parquet"];

    /// Detect the format from the file name
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if name.ends_with(".csv.gz") {
            Ok(Self::CsvGz)
        } else if name.ends_with(".csv") {
            Ok(Self::Csv)
        } else if name.ends_with(".parquet") {
            Ok(Self::Parquet)
        } else {
            Err(PrepError::UnsupportedFormat(path.to_path_buf()))
        }
    }
}

/// Resolve `dir/stem` with the first supported suffix that exists
///
/// Falls back to the CSV-gzip name so that a missing table is reported
/// under the canonical MIMIC file name.
#[must_use]
pub fn resolve_table_path(dir: &Path, stem: &str) -> PathBuf {
    TableFormat::SUFFIXES
        .iter()
        .map(|suffix| dir.join(format!("{stem}{suffix}")))
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| dir.join(format!("{stem}{}", TableFormat::SUFFIXES[0])))
}

/// Read the named columns of a table
///
/// # Arguments
/// * `path` - Path to the table file
/// * `table` - Table name used in log and error messages
/// * `columns` - Columns to read; every one must be present
///
/// # Returns
/// Record batches holding exactly `columns`, all nullable Utf8
pub fn read_table(path: &Path, table: &str, columns: &[&str]) -> Result<Vec<RecordBatch>> {
    let start = Instant::now();
    log_operation_start(&format!("Reading {table} from"), path);

    let batches = match TableFormat::from_path(path)? {
        TableFormat::Csv => read_csv(|| safe_open_file(path, table), table, columns)?,
        TableFormat::CsvGz => read_csv(
            || safe_open_file(path, table).map(MultiGzDecoder::new),
            table,
            columns,
        )?,
        TableFormat::Parquet => read_parquet_table(path, table, columns)?,
    };

    let rows = batches.iter().map(RecordBatch::num_rows).sum();
    log_operation_complete("read", path, rows, Some(start.elapsed()));
    Ok(batches)
}

fn projection(schema: &Schema, table: &str, columns: &[&str]) -> Result<Vec<usize>> {
    columns
        .iter()
        .map(|column| {
            schema
                .index_of(column)
                .map_err(|_| PrepError::missing_column(table, column))
        })
        .collect()
}

/// The header is read once to learn column names, then the file is reopened
/// and streamed with every column typed as Utf8.
fn read_csv<R, F>(open: F, table: &str, columns: &[&str]) -> Result<Vec<RecordBatch>>
where
    R: Read,
    F: Fn() -> Result<R>,
{
    let (header, _) = Format::default()
        .with_header(true)
        .infer_schema(open()?, Some(0))?;

    let schema = Arc::new(Schema::new(
        header
            .fields()
            .iter()
            .map(|field| Field::new(field.name(), DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));
    let projection = projection(&schema, table, columns)?;

    let reader = ReaderBuilder::new(schema)
        .with_header(true)
        .with_batch_size(DEFAULT_BATCH_SIZE)
        .with_projection(projection)
        .build(open()?)?;

    reader
        .collect::<std::result::Result<Vec<_>, ArrowError>>()
        .map_err(PrepError::from)
}

fn read_parquet_table(path: &Path, table: &str, columns: &[&str]) -> Result<Vec<RecordBatch>> {
    let file: File = safe_open_file(path, table)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let indices = projection(builder.schema(), table, columns)?;
    let mask = ProjectionMask::roots(builder.parquet_schema(), indices);

    let reader = builder
        .with_batch_size(DEFAULT_BATCH_SIZE)
        .with_projection(mask)
        .build()?;

    reader
        .map(|batch| cast_columns_to_utf8(&batch?))
        .collect()
}
