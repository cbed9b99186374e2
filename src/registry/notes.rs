//! `NOTEEVENTS` table loader

use arrow::array::Array;
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::models::ClinicalNote;
use crate::registry::TableLoader;
use crate::utils::arrow::{
    extract_date, extract_i64, extract_string, extract_timestamp, string_column,
};

const TABLE: &str = "NOTEEVENTS";

const COLUMNS: [&str; 6] = [
    "SUBJECT_ID",
    "HADM_ID",
    "CHARTDATE",
    "CHARTTIME",
    "CATEGORY",
    "TEXT",
];

/// Loader for the clinical notes table
#[derive(Debug, Clone, Copy, Default)]
pub struct NotesLoader;

impl TableLoader for NotesLoader {
    type Record = ClinicalNote;

    fn table_name(&self) -> &'static str {
        TABLE
    }

    fn columns(&self) -> &'static [&'static str] {
        &COLUMNS
    }

    /// Notes without a patient id are dropped. Note text is kept verbatim,
    /// including line breaks, for the text cleaner.
    fn deserialize_batch(&self, batch: &RecordBatch) -> Result<Vec<ClinicalNote>> {
        let subject = string_column(batch, TABLE, "SUBJECT_ID")?;
        let hadm = string_column(batch, TABLE, "HADM_ID")?;
        let chart_date = string_column(batch, TABLE, "CHARTDATE")?;
        let chart_time = string_column(batch, TABLE, "CHARTTIME")?;
        let category = string_column(batch, TABLE, "CATEGORY")?;
        let text = string_column(batch, TABLE, "TEXT")?;

        Ok((0..batch.num_rows())
            .filter_map(|row| {
                let subject_id = extract_i64(subject, row)?;
                Some(ClinicalNote {
                    subject_id,
                    hadm_id: extract_i64(hadm, row),
                    chart_date: extract_date(chart_date, row),
                    chart_time: extract_timestamp(chart_time, row),
                    category: extract_string(category, row),
                    text: (!text.is_null(row)).then(|| text.value(row).to_string()),
                })
            })
            .collect())
    }
}
