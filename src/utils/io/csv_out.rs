//! Writing datasets as CSV
//!
//! Rows are assembled into an Arrow record batch and written with the Arrow
//! CSV writer. Code lists are rendered as Python list literals, which is what
//! the downstream training code parses.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::csv::WriterBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::{PrepError, Result};
use crate::models::{AdmissionRecord, AdmissionType, CodeSpace, NoteChunk};
use crate::utils::logging::log_operation_complete;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render codes as a Python list literal, e.g. `['D_4019', 'D_25000']`
#[must_use]
pub fn python_list_literal(codes: &[String]) -> String {
    let items = codes
        .iter()
        .map(|code| format!("'{}'", code.replace('\\', "\\\\").replace('\'', "\\'")))
        .collect::<Vec<_>>();
    format!("[{}]", items.join(", "))
}

fn format_timestamp(value: Option<NaiveDateTime>) -> Option<String> {
    value.map(|timestamp| timestamp.format(TIMESTAMP_FORMAT).to_string())
}

/// Column-wise view over admission records
struct RecordColumns<'a> {
    records: Vec<&'a AdmissionRecord>,
}

impl RecordColumns<'_> {
    fn int(&self, value: impl Fn(&AdmissionRecord) -> i64) -> ArrayRef {
        Arc::new(Int64Array::from_iter_values(
            self.records.iter().map(|record| value(record)),
        ))
    }

    fn float(&self, value: impl Fn(&AdmissionRecord) -> Option<f64>) -> ArrayRef {
        Arc::new(Float64Array::from(
            self.records.iter().map(|record| value(record)).collect::<Vec<_>>(),
        ))
    }

    fn timestamp(&self, value: impl Fn(&AdmissionRecord) -> Option<NaiveDateTime>) -> ArrayRef {
        Arc::new(StringArray::from(
            self.records
                .iter()
                .map(|record| format_timestamp(value(record)))
                .collect::<Vec<_>>(),
        ))
    }

    fn text(&self, value: impl Fn(&AdmissionRecord) -> Option<String>) -> ArrayRef {
        Arc::new(StringArray::from(
            self.records.iter().map(|record| value(record)).collect::<Vec<_>>(),
        ))
    }

    fn list(&self, value: impl Fn(&AdmissionRecord) -> Option<&[String]>) -> ArrayRef {
        self.text(|record| value(record).map(python_list_literal))
    }

    fn coded(&self, space: CodeSpace) -> (&'static str, ArrayRef) {
        let column = match space {
            CodeSpace::DiagnosisIcd | CodeSpace::DiagnosisHierarchy | CodeSpace::DiagnosisGroup => {
                self.list(|record| record.diagnoses.as_ref().map(|codes| codes.space(space)))
            }
            CodeSpace::ProcedureIcd
            | CodeSpace::ProcedureHierarchy
            | CodeSpace::ProcedureGroup => {
                self.list(|record| record.procedures.as_ref().map(|codes| codes.space(space)))
            }
        };
        (space.column_name(), column)
    }

    fn next_codes(&self) -> Vec<(&'static str, ArrayRef)> {
        vec![
            (
                "NEXT_SMALL_DIAG_ICD9",
                self.list(|record| record.next.diagnosis_hierarchy.as_deref()),
            ),
            (
                "NEXT_DIAG_CCS",
                self.list(|record| record.next.diagnosis_group.as_deref()),
            ),
            (
                "NEXT_SMALL_PROC_ICD9",
                self.list(|record| record.next.procedure_hierarchy.as_deref()),
            ),
            (
                "NEXT_PROC_CCS",
                self.list(|record| record.next.procedure_group.as_deref()),
            ),
            ("NEXT_CUI", self.list(|record| record.next.concepts.as_deref())),
        ]
    }

    fn medications(&self) -> Vec<(&'static str, ArrayRef)> {
        vec![
            (
                "NDC",
                self.list(|record| record.medications.as_ref().map(|meds| meds.codes.as_slice())),
            ),
            (
                "CUI",
                self.list(|record| {
                    record
                        .medications
                        .as_ref()
                        .map(|meds| meds.concepts.as_slice())
                }),
            ),
        ]
    }
}

fn batch_from_columns(columns: Vec<(&'static str, ArrayRef)>) -> Result<RecordBatch> {
    let fields = columns
        .iter()
        .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
        .collect::<Vec<_>>();
    let arrays = columns.into_iter().map(|(_, array)| array).collect();
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Build the chunk-level dataset batch
pub fn chunk_batch(chunks: &[NoteChunk]) -> Result<RecordBatch> {
    let view = RecordColumns {
        records: chunks.iter().map(|chunk| chunk.record.as_ref()).collect(),
    };

    let mut columns = vec![
        ("SUBJECT_ID", view.int(AdmissionRecord::subject_id)),
        ("HADM_ID", view.int(AdmissionRecord::hadm_id)),
        ("ADMITTIME", view.timestamp(|record| record.admission.admit_time)),
        (
            "DAYS_NEXT_ADMIT",
            view.float(|record| record.admission.days_to_next_admit),
        ),
        (
            "DAYS_PREV_ADMIT",
            view.float(|record| record.admission.days_since_prev_admit),
        ),
        ("DURATION", view.float(|record| record.admission.duration)),
        view.coded(CodeSpace::DiagnosisIcd),
        view.coded(CodeSpace::DiagnosisHierarchy),
        view.coded(CodeSpace::DiagnosisGroup),
        view.coded(CodeSpace::ProcedureIcd),
        view.coded(CodeSpace::ProcedureHierarchy),
        view.coded(CodeSpace::ProcedureGroup),
    ];
    columns.extend(view.medications());
    columns.push((
        "Label",
        Arc::new(Int64Array::from_iter_values(
            chunks.iter().map(|chunk| i64::from(chunk.label())),
        )) as ArrayRef,
    ));
    columns.push((
        "TEXT",
        Arc::new(StringArray::from_iter_values(
            chunks.iter().map(|chunk| chunk.text.as_str()),
        )) as ArrayRef,
    ));
    columns.extend(view.next_codes());

    batch_from_columns(columns)
}

/// Build the admission-level table batch
pub fn admission_batch(records: &[Arc<AdmissionRecord>]) -> Result<RecordBatch> {
    let view = RecordColumns {
        records: records.iter().map(AsRef::as_ref).collect(),
    };
    let admission_type = |value: Option<&AdmissionType>| {
        value.map(|admission_type| admission_type.as_str().to_string())
    };

    let mut columns = vec![
        ("SUBJECT_ID", view.int(AdmissionRecord::subject_id)),
        ("HADM_ID", view.int(AdmissionRecord::hadm_id)),
        ("ADMITTIME", view.timestamp(|record| record.admission.admit_time)),
        ("DISCHTIME", view.timestamp(|record| record.admission.discharge_time)),
        ("DEATHTIME", view.timestamp(|record| record.admission.death_time)),
        (
            "ADMISSION_TYPE",
            view.text(|record| admission_type(record.admission.admission_type.as_ref())),
        ),
        (
            "NEXT_ADMITTIME",
            view.timestamp(|record| record.admission.next_admit_time),
        ),
        (
            "NEXT_ADMISSION_TYPE",
            view.text(|record| admission_type(record.admission.next_admission_type.as_ref())),
        ),
        (
            "PREV_DISCHTIME",
            view.timestamp(|record| record.admission.prev_discharge_time),
        ),
        (
            "PREV_ADMISSION_TYPE",
            view.text(|record| admission_type(record.admission.prev_admission_type.as_ref())),
        ),
        (
            "DAYS_NEXT_ADMIT",
            view.float(|record| record.admission.days_to_next_admit),
        ),
        (
            "DAYS_PREV_ADMIT",
            view.float(|record| record.admission.days_since_prev_admit),
        ),
        (
            "OUTPUT_LABEL",
            view.int(|record| i64::from(record.admission.label())),
        ),
        ("DURATION", view.float(|record| record.admission.duration)),
        view.coded(CodeSpace::DiagnosisIcd),
        view.coded(CodeSpace::DiagnosisHierarchy),
        view.coded(CodeSpace::DiagnosisGroup),
        view.coded(CodeSpace::ProcedureIcd),
        view.coded(CodeSpace::ProcedureHierarchy),
        view.coded(CodeSpace::ProcedureGroup),
    ];
    columns.extend(view.medications());
    columns.extend(view.next_codes());

    batch_from_columns(columns)
}

fn write_batch(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file = File::create(path).map_err(|e| PrepError::io_at(path, e))?;
    let mut writer = WriterBuilder::new()
        .with_header(true)
        .build(BufWriter::new(file));
    writer.write(batch)?;
    writer
        .into_inner()
        .flush()
        .map_err(|e| PrepError::io_at(path, e))?;

    log_operation_complete("wrote", path, batch.num_rows(), None);
    Ok(())
}

/// Write note chunks as one dataset CSV
pub fn write_chunk_table(path: &Path, chunks: &[NoteChunk]) -> Result<()> {
    write_batch(path, &chunk_batch(chunks)?)
}

/// Write the labeled admission table as CSV
pub fn write_admission_table(path: &Path, records: &[Arc<AdmissionRecord>]) -> Result<()> {
    write_batch(path, &admission_batch(records)?)
}

/// Write a value as pretty-printed JSON
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(|e| PrepError::io_at(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| PrepError::json(path, e))?;
    writer.flush().map_err(|e| PrepError::io_at(path, e))
}
