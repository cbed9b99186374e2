//! Note windows
//!
//! A note window decides which notes of an admission form its document: the
//! final discharge summary, or every note charted within the first days of
//! the stay.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::PrepError;
use crate::models::{AdmissionId, AdmissionRecord, ClinicalNote, PatientId};

/// Which notes make up an admission's document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteWindow {
    /// The last discharge summary written for the admission
    DischargeSummary,
    /// All notes charted less than `days` calendar days after admission
    EarlyNotes {
        /// Window length in days
        days: u32,
    },
}

/// The note text selected for one admission
#[derive(Debug, Clone)]
pub struct AdmissionDocument {
    /// Admission the text belongs to
    pub record: Arc<AdmissionRecord>,
    /// Raw selected text
    pub text: String,
}

impl NoteWindow {
    /// Output folder name of the window
    #[must_use]
    pub fn dir_name(self) -> String {
        match self {
            Self::DischargeSummary => "discharge".to_string(),
            Self::EarlyNotes { days } => format!("{days}days"),
        }
    }

    /// Minimum stay length for validation and test admissions
    ///
    /// An early-notes prediction is only meaningful if the patient is still
    /// in hospital when the window closes.
    #[must_use]
    pub fn min_duration_days(self) -> Option<f64> {
        match self {
            Self::DischargeSummary => None,
            Self::EarlyNotes { days } => Some(f64::from(days)),
        }
    }

    /// Select one document per admission in `records`
    ///
    /// Notes join admissions on patient and admission id; notes without an
    /// admission id never match. Admissions with no qualifying note are left
    /// out. Documents are ordered by patient, then admission id.
    #[must_use]
    pub fn select_documents(
        self,
        records: &[Arc<AdmissionRecord>],
        notes: &[ClinicalNote],
    ) -> Vec<AdmissionDocument> {
        let by_key: FxHashMap<(PatientId, AdmissionId), &Arc<AdmissionRecord>> = records
            .iter()
            .map(|record| ((record.subject_id(), record.hadm_id()), record))
            .collect();

        let mut grouped: FxHashMap<(PatientId, AdmissionId), Vec<&ClinicalNote>> =
            FxHashMap::default();
        for note in notes {
            let Some(hadm_id) = note.hadm_id else { continue };
            let key = (note.subject_id, hadm_id);
            if by_key.contains_key(&key) {
                grouped.entry(key).or_default().push(note);
            }
        }

        let mut documents: Vec<((PatientId, AdmissionId), AdmissionDocument)> = grouped
            .into_iter()
            .filter_map(|(key, mut admission_notes)| {
                admission_notes.sort_by_key(|note| note.chronological_key());
                let record = by_key.get(&key)?;
                let text = self.document_text(record, &admission_notes)?;
                Some((
                    key,
                    AdmissionDocument {
                        record: Arc::clone(record),
                        text,
                    },
                ))
            })
            .collect();
        documents.sort_by_key(|(key, _)| *key);

        log::info!(
            "{self} window: {} of {} admissions have note text",
            documents.len(),
            records.len()
        );
        documents.into_iter().map(|(_, document)| document).collect()
    }

    /// Document text from an admission's chronologically ordered notes
    fn document_text(self, record: &AdmissionRecord, notes: &[&ClinicalNote]) -> Option<String> {
        match self {
            Self::DischargeSummary => notes
                .iter()
                .rev()
                .find(|note| note.is_discharge_summary())
                .and_then(|note| note.text.clone()),
            Self::EarlyNotes { days } => {
                let admit_date = record.admission.admit_time?.date();
                let texts: Vec<&str> = notes
                    .iter()
                    .filter(|note| {
                        note.chart_date.is_some_and(|chart_date| {
                            (chart_date - admit_date).num_days() < i64::from(days)
                        })
                    })
                    .filter_map(|note| note.text.as_deref())
                    .collect();
                (!texts.is_empty()).then(|| texts.join(" "))
            }
        }
    }
}

impl fmt::Display for NoteWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dir_name())
    }
}

impl FromStr for NoteWindow {
    type Err = PrepError;

    /// Parse a window from its folder name, `discharge` or `<n>days`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "discharge" {
            return Ok(Self::DischargeSummary);
        }
        s.strip_suffix("days")
            .and_then(|days| days.parse::<u32>().ok())
            .filter(|&days| days > 0)
            .map(|days| Self::EarlyNotes { days })
            .ok_or_else(|| {
                PrepError::InvalidArgument(format!(
                    "unknown note window '{s}', expected 'discharge' or '<days>days'"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Admission, AdmissionType, RawAdmission};
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2150, 3, day).unwrap()
    }

    fn record(subject: i64, hadm: i64) -> Arc<AdmissionRecord> {
        let raw = RawAdmission::new(
            subject,
            hadm,
            date(1).and_hms_opt(14, 0, 0),
            date(9).and_hms_opt(10, 0, 0),
            AdmissionType::Emergency,
        );
        Arc::new(AdmissionRecord::new(Admission::from_raw(&raw)))
    }

    fn note(subject: i64, hadm: Option<i64>, day: u32, category: &str, text: Option<&str>) -> ClinicalNote {
        ClinicalNote {
            subject_id: subject,
            hadm_id: hadm,
            chart_date: Some(date(day)),
            chart_time: None,
            category: Some(category.to_string()),
            text: text.map(str::to_string),
        }
    }

    #[test]
    fn test_discharge_takes_latest_summary() {
        let records = vec![record(1, 10)];
        let notes = vec![
            note(1, Some(10), 9, "Discharge summary", Some("final")),
            note(1, Some(10), 8, "Discharge summary", Some("draft")),
            note(1, Some(10), 9, "Nursing", Some("nursing")),
        ];
        let docs = NoteWindow::DischargeSummary.select_documents(&records, &notes);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "final");
    }

    #[test]
    fn test_discharge_drops_admission_when_latest_summary_has_no_text() {
        let records = vec![record(1, 10)];
        let notes = vec![
            note(1, Some(10), 5, "Discharge summary", Some("early")),
            note(1, Some(10), 9, "Discharge summary", None),
        ];
        assert!(
            NoteWindow::DischargeSummary
                .select_documents(&records, &notes)
                .is_empty()
        );
    }

    #[test]
    fn test_early_window_concatenates_in_chart_order() {
        let records = vec![record(2, 21), record(1, 10)];
        let notes = vec![
            note(1, Some(10), 3, "Nursing", Some("day two")),
            note(1, Some(10), 1, "Radiology", Some("day zero")),
            note(1, Some(10), 4, "Nursing", Some("day three")),
            note(1, None, 1, "Nursing", Some("outpatient")),
            note(2, Some(21), 2, "Physician", Some("other patient")),
            note(2, Some(99), 2, "Physician", Some("unknown admission")),
        ];
        let docs = NoteWindow::EarlyNotes { days: 3 }.select_documents(&records, &notes);
        let texts: Vec<_> = docs.iter().map(|doc| doc.text.as_str()).collect();
        assert_eq!(texts, vec!["day zero day two", "other patient"]);
        assert_eq!(docs[0].record.hadm_id(), 10);
    }

    #[test]
    fn test_window_names() {
        assert_eq!(NoteWindow::DischargeSummary.dir_name(), "discharge");
        assert_eq!(NoteWindow::EarlyNotes { days: 2 }.dir_name(), "2days");
        assert_eq!("3days".parse::<NoteWindow>().unwrap(), NoteWindow::EarlyNotes { days: 3 });
        assert_eq!("Discharge".parse::<NoteWindow>().unwrap(), NoteWindow::DischargeSummary);
        assert!("0days".parse::<NoteWindow>().is_err());
        let window = NoteWindow::EarlyNotes { days: 3 };
        assert_eq!(window.to_string().parse::<NoteWindow>().unwrap(), window);
        assert!("weekly".parse::<NoteWindow>().is_err());
    }
}
