//! `PRESCRIPTIONS` table loader

use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::models::PrescriptionRecord;
use crate::registry::TableLoader;
use crate::utils::arrow::{extract_i64, extract_string, extract_timestamp, string_column};

const TABLE: &str = "PRESCRIPTIONS";

const COLUMNS: [&str; 3] = ["HADM_ID", "STARTDATE", "NDC"];

/// Loader for the prescriptions table
///
/// NDC values are kept as raw strings; the medication normalizer decides
/// which of them are usable codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrescriptionsLoader;

impl TableLoader for PrescriptionsLoader {
    type Record = PrescriptionRecord;

    fn table_name(&self) -> &'static str {
        TABLE
    }

    fn columns(&self) -> &'static [&'static str] {
        &COLUMNS
    }

    fn deserialize_batch(&self, batch: &RecordBatch) -> Result<Vec<PrescriptionRecord>> {
        let hadm = string_column(batch, TABLE, "HADM_ID")?;
        let start = string_column(batch, TABLE, "STARTDATE")?;
        let ndc = string_column(batch, TABLE, "NDC")?;

        Ok((0..batch.num_rows())
            .map(|row| PrescriptionRecord {
                hadm_id: extract_i64(hadm, row),
                start_date: extract_timestamp(start, row),
                ndc: extract_string(ndc, row),
            })
            .collect())
    }
}
