//! IO utilities for reading source tables and writing datasets

pub mod csv_out;
pub mod table;

pub use csv_out::{write_admission_table, write_chunk_table, write_json};
pub use table::{DEFAULT_BATCH_SIZE, TableFormat, read_table};
