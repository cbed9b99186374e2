//! `DIAGNOSES_ICD` and `PROCEDURES_ICD` table loader

use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::models::{CodeKind, CodeRecord};
use crate::registry::TableLoader;
use crate::utils::arrow::{extract_i64, extract_string, string_column};

const COLUMNS: [&str; 3] = ["HADM_ID", "SEQ_NUM", "ICD9_CODE"];

/// Loader for either ICD code table
#[derive(Debug, Clone, Copy)]
pub struct CodeTableLoader {
    kind: CodeKind,
}

impl CodeTableLoader {
    /// Create a loader for the table holding `kind` codes
    #[must_use]
    pub const fn new(kind: CodeKind) -> Self {
        Self { kind }
    }
}

impl TableLoader for CodeTableLoader {
    type Record = CodeRecord;

    fn table_name(&self) -> &'static str {
        self.kind.table_name()
    }

    fn columns(&self) -> &'static [&'static str] {
        &COLUMNS
    }

    fn deserialize_batch(&self, batch: &RecordBatch) -> Result<Vec<CodeRecord>> {
        let table = self.table_name();
        let hadm = string_column(batch, table, "HADM_ID")?;
        let seq = string_column(batch, table, "SEQ_NUM")?;
        let code = string_column(batch, table, "ICD9_CODE")?;

        Ok((0..batch.num_rows())
            .map(|row| CodeRecord {
                hadm_id: extract_i64(hadm, row),
                seq_num: extract_i64(seq, row),
                icd9_code: extract_string(code, row),
            })
            .collect())
    }
}
