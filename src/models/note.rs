//! Clinical note model

use crate::models::admission::{AdmissionId, PatientId};
use chrono::{NaiveDate, NaiveDateTime};

/// Note category holding discharge summaries
pub const DISCHARGE_SUMMARY_CATEGORY: &str = "Discharge summary";

/// A free-text note from the notes table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClinicalNote {
    /// Patient identifier
    pub subject_id: PatientId,
    /// Admission identifier; outpatient notes have none
    pub hadm_id: Option<AdmissionId>,
    /// Date the note was charted
    pub chart_date: Option<NaiveDate>,
    /// Time the note was charted, when recorded
    pub chart_time: Option<NaiveDateTime>,
    /// Note category
    pub category: Option<String>,
    /// Raw note text
    pub text: Option<String>,
}

impl ClinicalNote {
    /// Whether this note is a discharge summary
    #[must_use]
    pub fn is_discharge_summary(&self) -> bool {
        self.category
            .as_deref()
            .is_some_and(|category| category.trim() == DISCHARGE_SUMMARY_CATEGORY)
    }

    /// Key ordering notes chronologically within an admission; missing values sort last
    #[must_use]
    pub fn chronological_key(
        &self,
    ) -> (
        bool,
        Option<NaiveDate>,
        bool,
        Option<NaiveDateTime>,
    ) {
        (
            self.chart_date.is_none(),
            self.chart_date,
            self.chart_time.is_none(),
            self.chart_time,
        )
    }
}
