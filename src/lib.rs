//! Builds labeled, chunked 30-day readmission datasets from MIMIC-style
//! clinical tables.
//!
//! Admissions are labeled from each patient's admission sequence, enriched
//! with diagnosis, procedure and medication codes, and joined with clinical
//! notes. The notes are cleaned and cut into fixed-size chunks, and the chunks
//! are split into class-balanced train/validation/test sets per note window.

pub mod algorithm;
pub mod coding;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod registry;
pub mod utils;
pub mod vocab;

// Core types
pub use config::{InputPaths, PipelineConfig, PipelineConfigBuilder};
pub use error::{PrepError, Result};
pub use pipeline::{Pipeline, PipelineOutput, RunSummary, preflight, run_from_config};

// Stages
pub use algorithm::{AdmissionLabeler, NoteChunker, NoteWindow, SplitKind, SplitSampler};
pub use coding::{ClinicalCodeMapper, MedicationNormalizer};

// Vocabularies
pub use vocab::{FileVocabularyStore, MemoryVocabularyStore, Vocabulary, VocabularyKind, VocabularyStore};

// Loading
pub use registry::{load_reference_tables_async, load_tables_async};
