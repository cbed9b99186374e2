//! Dataset construction algorithms
//!
//! Readmission labeling, note selection and chunking, and the balanced
//! train/validation/test split.

pub mod labeling;
pub mod notes;
pub mod split;

pub use labeling::{AdmissionLabeler, LabelingOutcome};
pub use notes::{AdmissionDocument, NoteChunker, NoteCleaner, NoteWindow};
pub use split::{SplitKind, SplitPlan, SplitSampler, WindowSplits};
