//! Source table loaders
//!
//! One loader per MIMIC table. Each loader names the columns it needs, reads
//! them through the shared table reader, and deserializes every batch into
//! domain records. Reference code tables are JSON objects loaded by
//! [`lookup`].

pub mod admissions;
pub mod codes;
pub mod lookup;
pub mod notes;
pub mod prescriptions;

use std::path::Path;
use std::time::Instant;

use arrow::record_batch::RecordBatch;
use rayon::prelude::*;

use crate::config::InputPaths;
use crate::error::{PrepError, Result};
use crate::models::{ClinicalNote, CodeKind, CodeRecord, PrescriptionRecord, RawAdmission};
use crate::utils::io::read_table;

pub use admissions::AdmissionsLoader;
pub use codes::CodeTableLoader;
pub use lookup::CodeTable;
pub use notes::NotesLoader;
pub use prescriptions::PrescriptionsLoader;

/// Base trait for source table loaders
pub trait TableLoader: Send + Sync {
    /// Record type produced per row
    type Record: Send;

    /// Name of the source table
    fn table_name(&self) -> &'static str;

    /// Columns read from the table
    fn columns(&self) -> &'static [&'static str];

    /// Convert one record batch into records
    fn deserialize_batch(&self, batch: &RecordBatch) -> Result<Vec<Self::Record>>;

    /// Read the table at `path` and deserialize every batch, preserving row order
    fn load(&self, path: &Path) -> Result<Vec<Self::Record>> {
        let batches = read_table(path, self.table_name(), self.columns())?;
        let per_batch = batches
            .par_iter()
            .map(|batch| self.deserialize_batch(batch))
            .collect::<Result<Vec<_>>>()?;
        Ok(per_batch.into_iter().flatten().collect())
    }
}

/// Every source table, deserialized
#[derive(Debug, Clone)]
pub struct RawTables {
    /// Admissions table
    pub admissions: Vec<RawAdmission>,
    /// Diagnosis code rows
    pub diagnoses: Vec<CodeRecord>,
    /// Procedure code rows
    pub procedures: Vec<CodeRecord>,
    /// Prescription rows
    pub prescriptions: Vec<PrescriptionRecord>,
    /// Clinical notes
    pub notes: Vec<ClinicalNote>,
}

/// The reference tables used for code mapping
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    /// ICD code to CCS group code
    pub icd_to_group: CodeTable,
    /// ICD code to code description
    pub icd_to_text: CodeTable,
    /// NDC code to concept identifier
    pub ndc_to_concept: CodeTable,
}

async fn spawn_load<L>(loader: L, path: &Path) -> Result<Vec<L::Record>>
where
    L: TableLoader + 'static,
    L::Record: 'static,
{
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || loader.load(&path))
        .await
        .map_err(|e| PrepError::Task(format!("loading {} failed: {e}", loader_name::<L>())))?
}

fn loader_name<L>() -> &'static str {
    std::any::type_name::<L>()
        .rsplit("::")
        .next()
        .unwrap_or("table loader")
}

async fn spawn_lookup(path: &Path) -> Result<CodeTable> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || CodeTable::load(&path))
        .await
        .map_err(|e| PrepError::Task(format!("loading reference table failed: {e}")))?
}

/// Load every source table concurrently on the blocking thread pool
pub async fn load_tables_async(inputs: &InputPaths) -> Result<RawTables> {
    let start = Instant::now();

    let (admissions, diagnoses, procedures, prescriptions, notes) = futures::try_join!(
        spawn_load(AdmissionsLoader, &inputs.admissions),
        spawn_load(CodeTableLoader::new(CodeKind::Diagnosis), &inputs.diagnoses),
        spawn_load(CodeTableLoader::new(CodeKind::Procedure), &inputs.procedures),
        spawn_load(PrescriptionsLoader, &inputs.prescriptions),
        spawn_load(NotesLoader, &inputs.notes),
    )?;

    log::info!(
        "Loaded {} admissions, {} diagnoses, {} procedures, {} prescriptions and {} notes in {:?}",
        admissions.len(),
        diagnoses.len(),
        procedures.len(),
        prescriptions.len(),
        notes.len(),
        start.elapsed()
    );

    Ok(RawTables {
        admissions,
        diagnoses,
        procedures,
        prescriptions,
        notes,
    })
}

/// Load the three reference code tables concurrently
pub async fn load_reference_tables_async(inputs: &InputPaths) -> Result<ReferenceTables> {
    let (icd_to_group, icd_to_text, ndc_to_concept) = futures::try_join!(
        spawn_lookup(&inputs.icd_to_group),
        spawn_lookup(&inputs.icd_to_text),
        spawn_lookup(&inputs.ndc_to_concept),
    )?;

    Ok(ReferenceTables {
        icd_to_group,
        icd_to_text,
        ndc_to_concept,
    })
}
