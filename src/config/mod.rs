//! Configuration for the preprocessing pipeline.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::algorithm::notes::NoteWindow;
use crate::error::util::require_file;
use crate::error::{PrepError, Result};
use crate::utils::io::table::resolve_table_path;

/// Locations of every input the pipeline reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPaths {
    /// `ADMISSIONS` table
    pub admissions: PathBuf,
    /// `DIAGNOSES_ICD` table
    pub diagnoses: PathBuf,
    /// `PROCEDURES_ICD` table
    pub procedures: PathBuf,
    /// `PRESCRIPTIONS` table
    pub prescriptions: PathBuf,
    /// `NOTEEVENTS` table
    pub notes: PathBuf,
    /// JSON object mapping ICD codes to CCS group codes
    pub icd_to_group: PathBuf,
    /// JSON object mapping ICD codes to their description
    pub icd_to_text: PathBuf,
    /// JSON object mapping NDC codes to concept identifiers
    pub ndc_to_concept: PathBuf,
}

impl InputPaths {
    /// Resolve MIMIC-style file names under `data_dir` and the reference
    /// tables under `mappings_dir`
    ///
    /// Each table may be stored as `.csv.gz`, `.csv` or `.parquet`.
    #[must_use]
    pub fn from_data_dir(data_dir: &Path, mappings_dir: &Path) -> Self {
        Self {
            admissions: resolve_table_path(data_dir, "ADMISSIONS"),
            diagnoses: resolve_table_path(data_dir, "DIAGNOSES_ICD"),
            procedures: resolve_table_path(data_dir, "PROCEDURES_ICD"),
            prescriptions: resolve_table_path(data_dir, "PRESCRIPTIONS"),
            notes: resolve_table_path(data_dir, "NOTEEVENTS"),
            icd_to_group: mappings_dir
                .join("ICDandCCSmappings")
                .join("merged_icdccs_codes.json"),
            icd_to_text: mappings_dir
                .join("ICDandCCSmappings")
                .join("merged_icd_text.json"),
            ndc_to_concept: mappings_dir.join("NDCmappings").join("ndc_cui_map.json"),
        }
    }

    /// Every input with the purpose it serves
    #[must_use]
    pub fn entries(&self) -> [(&'static str, &Path); 8] {
        [
            ("admissions table", &self.admissions),
            ("diagnoses table", &self.diagnoses),
            ("procedures table", &self.procedures),
            ("prescriptions table", &self.prescriptions),
            ("notes table", &self.notes),
            ("ICD to CCS mapping", &self.icd_to_group),
            ("ICD to text mapping", &self.icd_to_text),
            ("NDC to concept mapping", &self.ndc_to_concept),
        ]
    }

    /// Fail on the first input that is not an existing file
    pub fn validate(&self) -> Result<()> {
        self.entries()
            .into_iter()
            .try_for_each(|(purpose, path)| require_file(path, purpose))
    }
}

/// Configuration for a preprocessing run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Input tables and reference mappings
    pub inputs: InputPaths,
    /// Directory receiving one folder of splits per note window
    pub output_dir: PathBuf,
    /// Directory holding the vocabulary files
    pub vocabulary_dir: PathBuf,
    /// Seed for every random draw
    pub seed: u64,
    /// An admission is readmitted if the next one starts within this many days
    pub readmission_window_days: f64,
    /// Words per note chunk
    pub chunk_words: usize,
    /// A trailing chunk is kept only if it has more words than this
    pub min_remainder_words: usize,
    /// Share of each class drawn for validation and test together
    pub val_test_fraction: f64,
    /// Share of the validation+test draw that goes to validation
    pub val_fraction: f64,
    /// Reserve admissions added to the discharge-summary training set
    pub discharge_reserve_size: usize,
    /// Reserve admissions added to each early-notes training set
    pub early_reserve_size: usize,
    /// Note windows to build datasets for
    pub windows: Vec<NoteWindow>,
    /// Replace existing split files
    pub overwrite: bool,
    /// Also write the labeled admission table
    pub write_admissions: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from("data");
        let mappings_dir = PathBuf::from("data/extended");
        Self {
            inputs: InputPaths::from_data_dir(&data_dir, &mappings_dir),
            output_dir: PathBuf::from("output"),
            vocabulary_dir: mappings_dir,
            seed: 1,
            readmission_window_days: 30.0,
            chunk_words: 318,
            min_remainder_words: 10,
            val_test_fraction: 0.2,
            val_fraction: 0.5,
            discharge_reserve_size: 400,
            early_reserve_size: 500,
            windows: vec![
                NoteWindow::DischargeSummary,
                NoteWindow::EarlyNotes { days: 3 },
                NoteWindow::EarlyNotes { days: 2 },
            ],
            overwrite: false,
            write_admissions: false,
        }
    }
}

impl PipelineConfig {
    /// Create a new builder for a pipeline configuration
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }

    /// Reserve draw size used for a note window's training set
    #[must_use]
    pub const fn reserve_size(&self, window: NoteWindow) -> usize {
        match window {
            NoteWindow::DischargeSummary => self.discharge_reserve_size,
            NoteWindow::EarlyNotes { .. } => self.early_reserve_size,
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.chunk_words == 0 {
            return Err(PrepError::InvalidArgument(
                "chunk size must be at least one word".to_string(),
            ));
        }
        for (name, fraction) in [
            ("val/test fraction", self.val_test_fraction),
            ("val fraction", self.val_fraction),
        ] {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(PrepError::InvalidArgument(format!(
                    "{name} must lie in [0, 1], got {fraction}"
                )));
            }
        }
        if !self.readmission_window_days.is_finite() || self.readmission_window_days <= 0.0 {
            return Err(PrepError::InvalidArgument(format!(
                "readmission window must be a positive number of days, got {}",
                self.readmission_window_days
            )));
        }
        if self.windows.is_empty() {
            return Err(PrepError::InvalidArgument(
                "at least one note window is required".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline Configuration:")?;
        writeln!(f, "  Admissions: {}", self.inputs.admissions.display())?;
        writeln!(f, "  Notes: {}", self.inputs.notes.display())?;
        writeln!(f, "  Output Directory: {}", self.output_dir.display())?;
        writeln!(f, "  Vocabulary Directory: {}", self.vocabulary_dir.display())?;
        writeln!(f, "  Seed: {}", self.seed)?;
        writeln!(f, "  Readmission Window: {} days", self.readmission_window_days)?;
        writeln!(
            f,
            "  Chunking: {} words, remainder kept above {} words",
            self.chunk_words, self.min_remainder_words
        )?;
        writeln!(
            f,
            "  Split: {} held out, {} of it validation",
            self.val_test_fraction, self.val_fraction
        )?;
        writeln!(
            f,
            "  Reserve Draws: {} discharge, {} early",
            self.discharge_reserve_size, self.early_reserve_size
        )?;
        let windows = self
            .windows
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(f, "  Windows: {windows}")?;
        writeln!(f, "  Overwrite: {}", self.overwrite)?;
        Ok(())
    }
}

/// Builder for constructing a pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineConfigBuilder {
    /// Create a new builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    /// Set the input paths
    #[must_use]
    pub fn inputs(mut self, inputs: InputPaths) -> Self {
        self.config.inputs = inputs;
        self
    }

    /// Set the output directory
    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Set the vocabulary directory
    #[must_use]
    pub fn vocabulary_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.vocabulary_dir = dir.into();
        self
    }

    /// Set the random seed
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Set the readmission window in days
    #[must_use]
    pub const fn readmission_window_days(mut self, days: f64) -> Self {
        self.config.readmission_window_days = days;
        self
    }

    /// Set the chunk size in words
    #[must_use]
    pub const fn chunk_words(mut self, words: usize) -> Self {
        self.config.chunk_words = words;
        self
    }

    /// Set the minimum size of a kept trailing chunk
    #[must_use]
    pub const fn min_remainder_words(mut self, words: usize) -> Self {
        self.config.min_remainder_words = words;
        self
    }

    /// Set the held-out fractions
    #[must_use]
    pub const fn split_fractions(mut self, val_test: f64, val: f64) -> Self {
        self.config.val_test_fraction = val_test;
        self.config.val_fraction = val;
        self
    }

    /// Set the reserve draw sizes
    #[must_use]
    pub const fn reserve_sizes(mut self, discharge: usize, early: usize) -> Self {
        self.config.discharge_reserve_size = discharge;
        self.config.early_reserve_size = early;
        self
    }

    /// Set the note windows
    #[must_use]
    pub fn windows(mut self, windows: Vec<NoteWindow>) -> Self {
        self.config.windows = windows;
        self
    }

    /// Set whether existing split files may be replaced
    #[must_use]
    pub const fn overwrite(mut self, overwrite: bool) -> Self {
        self.config.overwrite = overwrite;
        self
    }

    /// Set whether the labeled admission table is written
    #[must_use]
    pub const fn write_admissions(mut self, write: bool) -> Self {
        self.config.write_admissions = write;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> PipelineConfig {
        self.config
    }
}
