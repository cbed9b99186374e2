//! Error handling for the readmission preprocessing pipeline.

pub mod util;

use std::io;
use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Specialized error type for the preprocessing pipeline
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    /// Error opening or reading a file without path context
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error opening, reading or writing a specific path
    #[error("IO error at {}: {source}", path.display())]
    IoAt {
        /// Path involved in the failing operation
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Error decoding or encoding Arrow data (CSV reader/writer included)
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error reading Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error reading or writing a JSON document
    #[error("JSON error in {}: {source}", path.display())]
    Json {
        /// Path of the JSON document
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// A required input file does not exist
    #[error("Missing input file for {purpose}: {}", path.display())]
    MissingInput {
        /// What the file was needed for
        purpose: String,
        /// Expected location
        path: PathBuf,
    },

    /// A required column is absent from an input table
    #[error("Column {column} not found in table {table}")]
    MissingColumn {
        /// Table name
        table: String,
        /// Column name
        column: String,
    },

    /// The file extension does not name a supported table format
    #[error("Unsupported table format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Output would overwrite existing files or collide with a non-directory
    #[error("Output conflict: {0}")]
    OutputConflict(String),

    /// Not enough admissions to draw a requested sample
    #[error("Not enough {what}: needed {needed}, found {available}")]
    InsufficientSamples {
        /// Pool being sampled
        what: &'static str,
        /// Requested sample size
        needed: usize,
        /// Pool size
        available: usize,
    },

    /// Invalid configuration value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A text-cleaning pattern failed to compile
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A background loading task failed
    #[error("Task error: {0}")]
    Task(String),
}

impl PrepError {
    /// Wrap an IO error with the path it occurred on
    pub fn io_at(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::IoAt {
            path: path.into(),
            source,
        }
    }

    /// Wrap a JSON error with the document path
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    /// Create a missing column error
    pub fn missing_column(table: &str, column: &str) -> Self {
        Self::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PrepError>;
