//! Pipeline composition
//!
//! Each stage is a function over owned data; [`Pipeline::run`] composes them
//! in order: labeling, code mapping, medication normalization, the merge into
//! one admission table, and per note window the selection, chunking and
//! split assembly. Nothing is written until every window is computed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use itertools::Itertools;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::algorithm::labeling::{AdmissionLabeler, LabelingOutcome};
use crate::algorithm::notes::{NoteChunker, NoteWindow};
use crate::algorithm::split::{SplitKind, SplitPlan, SplitSampler, WindowSplits, WindowSummary};
use crate::coding::{ClinicalCodeMapper, MappingStats, MedicationNormalizer, MedicationStats};
use crate::config::PipelineConfig;
use crate::error::util::ensure_output_directory;
use crate::error::{PrepError, Result};
use crate::models::{
    Admission, AdmissionId, AdmissionRecord, ClinicalNote, CodeKind, CodeRecord, CodedList,
    MedicationList, NextAdmissionCodes, NoteChunk, PrescriptionRecord, RawAdmission,
};
use crate::registry::{
    RawTables, ReferenceTables, load_reference_tables_async, load_tables_async,
};
use crate::utils::io::{write_admission_table, write_chunk_table, write_json};
use crate::utils::logging::{create_spinner, finish_progress_bar, log_operation_start};
use crate::vocab::{FileVocabularyStore, VocabularyStore};

/// File name of the labeled admission table
pub const ADMISSIONS_FILE: &str = "admissions.csv";

/// File name of the run summary
pub const SUMMARY_FILE: &str = "split_summary.json";

/// Counts reported for one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Seed used for every draw
    pub seed: u64,
    /// Admissions kept after exclusions
    pub admissions: usize,
    /// Kept admissions labeled readmitted
    pub readmitted: usize,
    /// Birth admissions removed
    pub excluded_newborn: usize,
    /// In-hospital death admissions removed
    pub excluded_deceased: usize,
    /// Diagnosis code mapping counters
    pub diagnosis_mapping: MappingStats,
    /// Procedure code mapping counters
    pub procedure_mapping: MappingStats,
    /// Medication normalization counters
    pub medication_mapping: MedicationStats,
    /// Admissions planned for training
    pub train_admissions: usize,
    /// Admissions planned for validation
    pub val_admissions: usize,
    /// Admissions planned for testing
    pub test_admissions: usize,
    /// Negative admissions left for reserve draws
    pub reserve_pool: usize,
    /// Chunk counts per window and split
    pub windows: Vec<WindowSummary>,
}

/// Everything a run computes, ready to be written
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Merged admission table
    pub records: Vec<Arc<AdmissionRecord>>,
    /// Admission-level split
    pub plan: SplitPlan,
    /// Chunk datasets, one per configured window
    pub windows: Vec<WindowSplits>,
    /// Run counters
    pub summary: RunSummary,
}

/// Per-admission coded history produced by the mapping stages
#[derive(Debug, Clone, Default)]
pub struct CodedHistory {
    /// Diagnosis lists by admission
    pub diagnoses: FxHashMap<AdmissionId, CodedList>,
    /// Procedure lists by admission
    pub procedures: FxHashMap<AdmissionId, CodedList>,
    /// Medication lists by admission
    pub medications: FxHashMap<AdmissionId, MedicationList>,
}

/// The preprocessing pipeline over one vocabulary store
#[derive(Debug)]
pub struct Pipeline<S: VocabularyStore> {
    config: PipelineConfig,
    store: S,
}

impl<S: VocabularyStore> Pipeline<S> {
    /// Create a pipeline
    pub fn new(config: PipelineConfig, store: S) -> Self {
        Self { config, store }
    }

    /// Configuration of the pipeline
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Vocabulary store of the pipeline
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Label admissions and drop excluded ones
    pub fn label_admissions(&self, raw: Vec<RawAdmission>) -> LabelingOutcome {
        AdmissionLabeler::new(self.config.readmission_window_days).label(raw)
    }

    /// Group code rows per admission in sequence order and map them
    pub fn attach_codes(
        &self,
        kind: CodeKind,
        rows: Vec<CodeRecord>,
        references: &ReferenceTables,
    ) -> Result<(FxHashMap<AdmissionId, CodedList>, MappingStats)> {
        let mut rows: Vec<(AdmissionId, Option<i64>, String)> = rows
            .into_iter()
            .filter_map(|row| {
                let code = row.icd9_code.filter(|code| !code.trim().is_empty())?;
                Some((row.hadm_id?, row.seq_num, kind.qualify(&code)))
            })
            .collect();
        rows.sort_by_key(|(hadm_id, seq_num, _)| (*hadm_id, seq_num.is_none(), *seq_num));

        let mut per_admission: Vec<(AdmissionId, Vec<String>)> = Vec::new();
        for (hadm_id, group) in &rows.into_iter().chunk_by(|(hadm_id, _, _)| *hadm_id) {
            per_admission.push((hadm_id, group.map(|(_, _, code)| code).collect()));
        }

        log::info!(
            "{}: codes for {} admissions",
            kind.table_name(),
            per_admission.len()
        );
        let mapper = ClinicalCodeMapper::new(
            &references.icd_to_group,
            &references.icd_to_text,
            &self.store,
        );
        let (lists, stats) = mapper.map(per_admission)?;
        Ok((lists.into_iter().collect(), stats))
    }

    /// Group prescriptions per admission in start order and normalize them
    pub fn attach_medications(
        &self,
        rows: Vec<PrescriptionRecord>,
        references: &ReferenceTables,
    ) -> Result<(FxHashMap<AdmissionId, MedicationList>, MedicationStats)> {
        let mut rows: Vec<(AdmissionId, PrescriptionRecord)> = rows
            .into_iter()
            .filter_map(|row| Some((row.hadm_id?, row)))
            .collect();
        rows.sort_by_key(|(hadm_id, row)| (*hadm_id, row.start_date.is_none(), row.start_date));

        let mut per_admission: Vec<(AdmissionId, Vec<Option<String>>)> = Vec::new();
        for (hadm_id, group) in &rows.into_iter().chunk_by(|(hadm_id, _)| *hadm_id) {
            per_admission.push((hadm_id, group.map(|(_, row)| row.ndc).collect()));
        }

        let normalizer = MedicationNormalizer::new(&references.ndc_to_concept, &self.store);
        let (lists, stats) = normalizer.normalize(per_admission)?;
        Ok((lists.into_iter().collect(), stats))
    }

    /// Join admissions with their coded history and link each to the
    /// patient's next admission in the final table
    #[must_use]
    pub fn merge(&self, admissions: Vec<Admission>, mut history: CodedHistory) -> Vec<Arc<AdmissionRecord>> {
        let mut records: Vec<AdmissionRecord> = admissions
            .into_iter()
            .map(|admission| {
                let hadm_id = admission.hadm_id;
                let mut record = AdmissionRecord::new(admission);
                record.diagnoses = history.diagnoses.remove(&hadm_id);
                record.procedures = history.procedures.remove(&hadm_id);
                record.medications = history.medications.remove(&hadm_id);
                record
            })
            .collect();

        let next_codes: Vec<NextAdmissionCodes> = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                records
                    .get(i + 1)
                    .filter(|next| next.subject_id() == record.subject_id())
                    .map(NextAdmissionCodes::from_record)
                    .unwrap_or_default()
            })
            .collect();
        for (record, next) in records.iter_mut().zip(next_codes) {
            record.next = next;
        }

        records.into_iter().map(Arc::new).collect()
    }

    /// Select, clean and chunk the notes of one window
    pub fn build_window(
        &self,
        window: NoteWindow,
        records: &[Arc<AdmissionRecord>],
        notes: &[ClinicalNote],
        chunker: &NoteChunker,
    ) -> Vec<NoteChunk> {
        let documents = window.select_documents(records, notes);
        chunker.chunk_documents(&documents)
    }

    /// Run every stage over loaded tables
    pub fn run(&self, tables: RawTables, references: &ReferenceTables) -> Result<PipelineOutput> {
        let start = Instant::now();
        let RawTables {
            admissions,
            diagnoses,
            procedures,
            prescriptions,
            notes,
        } = tables;

        let labeled = self.label_admissions(admissions);
        let (diagnoses, diagnosis_mapping) =
            self.attach_codes(CodeKind::Diagnosis, diagnoses, references)?;
        let (procedures, procedure_mapping) =
            self.attach_codes(CodeKind::Procedure, procedures, references)?;
        let (medications, medication_mapping) = self.attach_medications(prescriptions, references)?;

        let sampler = SplitSampler::new(
            self.config.seed,
            self.config.val_test_fraction,
            self.config.val_fraction,
        );
        let plan = sampler.plan(&labeled.admissions)?;

        let readmitted = labeled.readmitted();
        let records = self.merge(
            labeled.admissions,
            CodedHistory {
                diagnoses,
                procedures,
                medications,
            },
        );

        let chunker = NoteChunker::new(self.config.chunk_words, self.config.min_remainder_words)?;
        let windows: Vec<WindowSplits> = self
            .config
            .windows
            .iter()
            .map(|&window| {
                let chunks = self.build_window(window, &records, &notes, &chunker);
                sampler.assemble(window, &plan, self.config.reserve_size(window), chunks)
            })
            .collect();

        let summary = RunSummary {
            seed: self.config.seed,
            admissions: records.len(),
            readmitted,
            excluded_newborn: labeled.excluded_newborn,
            excluded_deceased: labeled.excluded_deceased,
            diagnosis_mapping,
            procedure_mapping,
            medication_mapping,
            train_admissions: plan.train.len(),
            val_admissions: plan.val.len(),
            test_admissions: plan.test.len(),
            reserve_pool: plan.reserve.len(),
            windows: windows.iter().map(WindowSplits::summary).collect(),
        };

        log::info!("Pipeline computed {} windows in {:?}", windows.len(), start.elapsed());
        Ok(PipelineOutput {
            records,
            plan,
            windows,
            summary,
        })
    }

    /// Write every dataset of a finished run
    pub fn write_outputs(&self, output: &PipelineOutput) -> Result<()> {
        let output_dir = &self.config.output_dir;
        ensure_output_directory(output_dir, "dataset output")?;

        for splits in &output.windows {
            let dir = window_dir(output_dir, splits.window);
            ensure_output_directory(&dir, "note window splits")?;
            for kind in SplitKind::ALL {
                let path = dir.join(kind.file_name());
                log_operation_start("Writing", &path);
                write_chunk_table(&path, splits.chunks(kind))?;
            }
        }

        if self.config.write_admissions {
            let path = output_dir.join(ADMISSIONS_FILE);
            log_operation_start("Writing", &path);
            write_admission_table(&path, &output.records)?;
        }

        write_json(&output_dir.join(SUMMARY_FILE), &output.summary)
    }
}

/// Every file a run with `config` would create in the output directory
#[must_use]
pub fn planned_outputs(config: &PipelineConfig) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = config
        .windows
        .iter()
        .flat_map(|window| {
            let dir = window_dir(&config.output_dir, *window);
            SplitKind::ALL
                .into_iter()
                .map(move |kind| dir.join(kind.file_name()))
        })
        .collect();
    if config.write_admissions {
        paths.push(config.output_dir.join(ADMISSIONS_FILE));
    }
    paths
}

/// Check inputs and outputs before any work is done
///
/// Fails on missing inputs, an output path occupied by a file, and existing
/// split files unless overwriting is enabled.
pub fn preflight(config: &PipelineConfig) -> Result<()> {
    config.validate()?;
    config.inputs.validate()?;

    for dir in [&config.output_dir, &config.vocabulary_dir] {
        if dir.exists() && !dir.is_dir() {
            return Err(PrepError::OutputConflict(format!(
                "{} exists and is not a directory",
                dir.display()
            )));
        }
    }

    if !config.overwrite {
        let existing: Vec<String> = planned_outputs(config)
            .iter()
            .filter(|path| path.exists())
            .map(|path| path.display().to_string())
            .collect();
        if !existing.is_empty() {
            return Err(PrepError::OutputConflict(format!(
                "output files already exist (use --overwrite to replace them): {}",
                existing.join(", ")
            )));
        }
    }
    Ok(())
}

/// Load every input of `config`, run the pipeline and write its outputs
///
/// Vocabularies are stored as files under the configured vocabulary
/// directory.
pub async fn run_from_config(config: PipelineConfig) -> Result<RunSummary> {
    let start = Instant::now();
    preflight(&config)?;
    log::info!("{config}");

    let store = FileVocabularyStore::new(&config.vocabulary_dir)?;

    let spinner = create_spinner(Some("Loading tables"));
    let (tables, references) = futures::try_join!(
        load_tables_async(&config.inputs),
        load_reference_tables_async(&config.inputs),
    )?;
    finish_progress_bar(&spinner, Some("Tables loaded"));
    log::info!(
        "Loaded reference tables: {} ICD groups, {} ICD descriptions, {} NDC concepts",
        references.icd_to_group.len(),
        references.icd_to_text.len(),
        references.ndc_to_concept.len()
    );

    let pipeline = Pipeline::new(config, store);
    let summary = tokio::task::spawn_blocking(move || -> Result<RunSummary> {
        let output = pipeline.run(tables, &references)?;
        pipeline.write_outputs(&output)?;
        Ok(output.summary)
    })
    .await
    .map_err(|e| PrepError::Task(format!("pipeline run failed: {e}")))??;

    log::info!("Finished in {:?}", start.elapsed());
    Ok(summary)
}

/// Output folder of `window` under `output_dir`
#[must_use]
pub fn window_dir(output_dir: &Path, window: NoteWindow) -> PathBuf {
    output_dir.join(window.dir_name())
}
