//! Domain models for the readmission dataset
//!
//! Raw source rows, the labeled admission, coded history, and the note chunks
//! that form the output datasets.

pub mod admission;
pub mod chunk;
pub mod codes;
pub mod medication;
pub mod note;

pub use admission::{Admission, AdmissionId, AdmissionType, PatientId, RawAdmission};
pub use chunk::{AdmissionRecord, NextAdmissionCodes, NoteChunk};
pub use codes::{CodeKind, CodeRecord, CodeSpace, CodedList};
pub use medication::{MedicationList, PrescriptionRecord};
pub use note::ClinicalNote;
