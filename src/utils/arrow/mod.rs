//! Arrow data handling utilities
//!
//! Column access and typed value extraction for the string-typed record
//! batches produced by the table reader.

pub mod array_utils;
pub mod extractors;

pub use array_utils::{cast_columns_to_utf8, string_column};
pub use extractors::{
    extract_date, extract_i64, extract_string, extract_timestamp, parse_date,
    parse_timestamp,
};
