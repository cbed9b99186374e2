//! Admission-level records and the note chunks exploded from them

use std::sync::Arc;

use crate::models::admission::{Admission, AdmissionId, PatientId};
use crate::models::codes::CodedList;
use crate::models::medication::MedicationList;

/// Code lists of the patient's following admission, used as auxiliary targets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NextAdmissionCodes {
    /// Hierarchy-reduced diagnoses of the next admission
    pub diagnosis_hierarchy: Option<Vec<String>>,
    /// Diagnosis group codes of the next admission
    pub diagnosis_group: Option<Vec<String>>,
    /// Hierarchy-reduced procedures of the next admission
    pub procedure_hierarchy: Option<Vec<String>>,
    /// Procedure group codes of the next admission
    pub procedure_group: Option<Vec<String>>,
    /// Medication concepts of the next admission
    pub concepts: Option<Vec<String>>,
}

impl NextAdmissionCodes {
    /// Take the code lists of `next` as the following admission's codes
    #[must_use]
    pub fn from_record(next: &AdmissionRecord) -> Self {
        Self {
            diagnosis_hierarchy: next.diagnoses.as_ref().map(|codes| codes.hierarchy.clone()),
            diagnosis_group: next.diagnoses.as_ref().map(|codes| codes.group.clone()),
            procedure_hierarchy: next.procedures.as_ref().map(|codes| codes.hierarchy.clone()),
            procedure_group: next.procedures.as_ref().map(|codes| codes.group.clone()),
            concepts: next.medications.as_ref().map(|meds| meds.concepts.clone()),
        }
    }
}

/// One row of the joined admission table
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionRecord {
    /// Labeled admission
    pub admission: Admission,
    /// Diagnosis codes; `None` when the admission has no diagnosis rows
    pub diagnoses: Option<CodedList>,
    /// Procedure codes; `None` when the admission has no procedure rows
    pub procedures: Option<CodedList>,
    /// Medications; `None` when the admission has no prescriptions
    pub medications: Option<MedicationList>,
    /// Codes of the patient's next admission in the final table
    pub next: NextAdmissionCodes,
}

impl AdmissionRecord {
    /// Record without any coded history
    #[must_use]
    pub fn new(admission: Admission) -> Self {
        Self {
            admission,
            diagnoses: None,
            procedures: None,
            medications: None,
            next: NextAdmissionCodes::default(),
        }
    }

    /// Patient identifier
    #[must_use]
    pub const fn subject_id(&self) -> PatientId {
        self.admission.subject_id
    }

    /// Admission identifier
    #[must_use]
    pub const fn hadm_id(&self) -> AdmissionId {
        self.admission.hadm_id
    }
}

/// A fixed-size slice of an admission's note text
///
/// Every chunk shares its admission record, so each output row repeats the
/// admission's structured fields and label verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteChunk {
    /// Admission the text belongs to
    pub record: Arc<AdmissionRecord>,
    /// Space-joined chunk words
    pub text: String,
}

impl NoteChunk {
    /// Admission identifier of the chunk
    #[must_use]
    pub fn hadm_id(&self) -> AdmissionId {
        self.record.hadm_id()
    }

    /// Label of the chunk's admission
    #[must_use]
    pub fn label(&self) -> u8 {
        self.record.admission.label()
    }

    /// Number of words in the chunk
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}
