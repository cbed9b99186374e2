//! Medication models

use crate::models::admission::AdmissionId;
use chrono::NaiveDateTime;

/// A raw prescription row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrescriptionRecord {
    /// Admission the prescription belongs to
    pub hadm_id: Option<AdmissionId>,
    /// Start of the prescription
    pub start_date: Option<NaiveDateTime>,
    /// National Drug Code as written in the source; may be missing, `0` or non-numeric
    pub ndc: Option<String>,
}

/// Deduplicated medication codes and their concept identifiers for one admission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MedicationList {
    /// Valid NDCs in first-prescribed order
    pub codes: Vec<String>,
    /// Concept identifiers in first-resolved order
    pub concepts: Vec<String>,
}
