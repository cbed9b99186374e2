//! Clinical code normalization
//!
//! Hierarchy reduction and group mapping of ICD codes, and deduplication and
//! concept resolution of medication codes. Both mappers build their
//! vocabularies through a [`VocabularyStore`](crate::vocab::VocabularyStore).

pub mod hierarchy;
pub mod mapper;
pub mod medication;

pub use hierarchy::{reduce, try_reduce};
pub use mapper::{ClinicalCodeMapper, MappingStats};
pub use medication::{MedicationNormalizer, MedicationStats, coerce_code};
