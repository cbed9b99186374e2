//! `ADMISSIONS` table loader

use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::models::{AdmissionType, RawAdmission};
use crate::registry::TableLoader;
use crate::utils::arrow::{extract_i64, extract_string, extract_timestamp, string_column};
use crate::utils::logging::log_warning;

const TABLE: &str = "ADMISSIONS";

const COLUMNS: [&str; 6] = [
    "SUBJECT_ID",
    "HADM_ID",
    "ADMITTIME",
    "DISCHTIME",
    "DEATHTIME",
    "ADMISSION_TYPE",
];

/// Loader for the admissions table
#[derive(Debug, Clone, Copy, Default)]
pub struct AdmissionsLoader;

impl TableLoader for AdmissionsLoader {
    type Record = RawAdmission;

    fn table_name(&self) -> &'static str {
        TABLE
    }

    fn columns(&self) -> &'static [&'static str] {
        &COLUMNS
    }

    /// Rows without a patient or admission id cannot be linked to anything
    /// and are skipped; unparseable timestamps become `None`.
    fn deserialize_batch(&self, batch: &RecordBatch) -> Result<Vec<RawAdmission>> {
        let subject = string_column(batch, TABLE, "SUBJECT_ID")?;
        let hadm = string_column(batch, TABLE, "HADM_ID")?;
        let admit = string_column(batch, TABLE, "ADMITTIME")?;
        let discharge = string_column(batch, TABLE, "DISCHTIME")?;
        let death = string_column(batch, TABLE, "DEATHTIME")?;
        let admission_type = string_column(batch, TABLE, "ADMISSION_TYPE")?;

        let mut skipped = 0usize;
        let mut records = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let (Some(subject_id), Some(hadm_id)) = (extract_i64(subject, row), extract_i64(hadm, row))
            else {
                skipped += 1;
                continue;
            };

            records.push(RawAdmission {
                subject_id,
                hadm_id,
                admit_time: extract_timestamp(admit, row),
                discharge_time: extract_timestamp(discharge, row),
                death_time: extract_timestamp(death, row),
                admission_type: extract_string(admission_type, row)
                    .map(|value| AdmissionType::from(value.as_str())),
            });
        }

        if skipped > 0 {
            log_warning(
                &format!("Skipped {skipped} {TABLE} rows without SUBJECT_ID or HADM_ID"),
                None,
            );
        }
        Ok(records)
    }
}
