//! Coded clinical history models
//!
//! Diagnosis and procedure codes attached to an admission, in their full ICD
//! form and in the two coarser code spaces derived from it.

use crate::models::admission::AdmissionId;

/// Source table of a clinical code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeKind {
    /// Diagnosis codes (`DIAGNOSES_ICD`)
    Diagnosis,
    /// Procedure codes (`PROCEDURES_ICD`)
    Procedure,
}

impl CodeKind {
    /// Prefix that marks the code's source in every code space
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Diagnosis => "D_",
            Self::Procedure => "P_",
        }
    }

    /// Name of the source table
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Diagnosis => "DIAGNOSES_ICD",
            Self::Procedure => "PROCEDURES_ICD",
        }
    }

    /// Prefix a raw ICD code with the source marker
    #[must_use]
    pub fn qualify(self, raw_code: &str) -> String {
        format!("{}{}", self.prefix(), raw_code.trim())
    }
}

/// The six code spaces an admission's codes are expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeSpace {
    /// Full diagnosis ICD codes
    DiagnosisIcd,
    /// Top-level diagnosis hierarchy bucket
    DiagnosisHierarchy,
    /// Diagnosis CCS group codes
    DiagnosisGroup,
    /// Full procedure ICD codes
    ProcedureIcd,
    /// Top-level procedure hierarchy bucket
    ProcedureHierarchy,
    /// Procedure CCS group codes
    ProcedureGroup,
}

impl CodeSpace {
    /// Output column holding this code space
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::DiagnosisIcd => "DIAG_ICD9",
            Self::DiagnosisHierarchy => "SMALL_DIAG_ICD9",
            Self::DiagnosisGroup => "DIAG_CCS",
            Self::ProcedureIcd => "PROC_ICD9",
            Self::ProcedureHierarchy => "SMALL_PROC_ICD9",
            Self::ProcedureGroup => "PROC_CCS",
        }
    }
}

/// A raw row of a diagnosis or procedure table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRecord {
    /// Admission the code was assigned in
    pub hadm_id: Option<AdmissionId>,
    /// Priority of the code within the admission
    pub seq_num: Option<i64>,
    /// Unprefixed ICD code
    pub icd9_code: Option<String>,
}

/// Codes of one kind for a single admission, in all three code spaces
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodedList {
    /// Prefixed ICD codes ordered by sequence number
    pub icd: Vec<String>,
    /// Hierarchy-reduced codes, deduplicated in first-seen order
    pub hierarchy: Vec<String>,
    /// Group codes, deduplicated in first-seen order
    pub group: Vec<String>,
}

impl CodedList {
    /// Start a list from the ordered ICD codes
    #[must_use]
    pub fn from_icd(icd: Vec<String>) -> Self {
        Self {
            icd,
            hierarchy: Vec::new(),
            group: Vec::new(),
        }
    }

    /// Codes held for one of this list's code spaces
    #[must_use]
    pub fn space(&self, space: CodeSpace) -> &[String] {
        match space {
            CodeSpace::DiagnosisIcd | CodeSpace::ProcedureIcd => &self.icd,
            CodeSpace::DiagnosisHierarchy | CodeSpace::ProcedureHierarchy => &self.hierarchy,
            CodeSpace::DiagnosisGroup | CodeSpace::ProcedureGroup => &self.group,
        }
    }
}

/// Append `code` unless it is already present, keeping first-seen order
pub fn push_unique(list: &mut Vec<String>, code: &str) -> bool {
    if list.iter().any(|existing| existing == code) {
        return false;
    }
    list.push(code.to_string());
    true
}
