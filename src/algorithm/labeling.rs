//! Readmission labeling
//!
//! Each patient's admissions are ordered chronologically and linked to the
//! following and preceding stay. Elective admissions are planned, so they are
//! skipped as "next admission" candidates: a stay followed by an elective one
//! is linked to the first later non-elective admission instead.

use std::cmp::Ordering;
use std::time::Instant;

use rayon::prelude::*;

use crate::models::admission::days_between;
use crate::models::{Admission, AdmissionType, RawAdmission};
use crate::utils::logging::{create_main_progress_bar, finish_progress_bar, log_stage_complete};

/// Default readmission window in days
pub const DEFAULT_READMISSION_WINDOW_DAYS: f64 = 30.0;

/// Labeled admissions and exclusion counts
#[derive(Debug, Clone, Default)]
pub struct LabelingOutcome {
    /// Retained admissions ordered by patient and admission time
    pub admissions: Vec<Admission>,
    /// Birth admissions removed
    pub excluded_newborn: usize,
    /// Admissions removed because the patient died during the stay
    pub excluded_deceased: usize,
}

impl LabelingOutcome {
    /// Number of admissions labeled as readmitted
    #[must_use]
    pub fn readmitted(&self) -> usize {
        self.admissions
            .iter()
            .filter(|admission| admission.readmitted)
            .count()
    }
}

/// Derives temporal links and the readmission label per admission
#[derive(Debug, Clone, Copy)]
pub struct AdmissionLabeler {
    window_days: f64,
}

impl Default for AdmissionLabeler {
    fn default() -> Self {
        Self::new(DEFAULT_READMISSION_WINDOW_DAYS)
    }
}

/// Fill each missing value with the next present value after it
fn backward_fill<T: Clone>(values: &mut [Option<T>]) {
    let mut carry: Option<T> = None;
    for value in values.iter_mut().rev() {
        if value.is_some() {
            carry.clone_from(value);
        } else {
            value.clone_from(&carry);
        }
    }
}

/// Chronological order with missing admission times last
fn admission_order(a: &RawAdmission, b: &RawAdmission) -> Ordering {
    a.subject_id.cmp(&b.subject_id).then_with(|| {
        (a.admit_time.is_none(), a.admit_time).cmp(&(b.admit_time.is_none(), b.admit_time))
    })
}

impl AdmissionLabeler {
    /// Create a labeler counting a readmission within `window_days` days
    #[must_use]
    pub const fn new(window_days: f64) -> Self {
        Self { window_days }
    }

    /// Label one patient's admissions, given in chronological order
    ///
    /// Excluded admissions are still labeled here; they take part in the
    /// chaining of their neighbours.
    #[must_use]
    pub fn label_patient(&self, rows: &[RawAdmission]) -> Vec<Admission> {
        let mut next_admit: Vec<_> = (0..rows.len())
            .map(|i| rows.get(i + 1).and_then(|next| next.admit_time))
            .collect();
        let mut next_type: Vec<_> = (0..rows.len())
            .map(|i| rows.get(i + 1).and_then(|next| next.admission_type.clone()))
            .collect();

        for (time, kind) in next_admit.iter_mut().zip(next_type.iter_mut()) {
            if *kind == Some(AdmissionType::Elective) {
                *time = None;
                *kind = None;
            }
        }
        backward_fill(&mut next_admit);
        backward_fill(&mut next_type);

        let mut prev_discharge: Vec<_> = (0..rows.len())
            .map(|i| i.checked_sub(1).and_then(|prev| rows[prev].discharge_time))
            .collect();
        let mut prev_type: Vec<_> = (0..rows.len())
            .map(|i| {
                i.checked_sub(1)
                    .and_then(|prev| rows[prev].admission_type.clone())
            })
            .collect();
        backward_fill(&mut prev_discharge);
        backward_fill(&mut prev_type);

        rows.iter()
            .zip(next_admit)
            .zip(next_type)
            .zip(prev_discharge)
            .zip(prev_type)
            .map(|((((raw, next_admit), next_type), prev_discharge), prev_type)| {
                let mut admission = Admission::from_raw(raw);
                admission.days_to_next_admit = days_between(next_admit, raw.discharge_time);
                admission.days_since_prev_admit = days_between(raw.admit_time, prev_discharge);
                admission.readmitted = admission
                    .days_to_next_admit
                    .is_some_and(|days| days < self.window_days);
                admission.next_admit_time = next_admit;
                admission.next_admission_type = next_type;
                admission.prev_discharge_time = prev_discharge;
                admission.prev_admission_type = prev_type;
                admission
            })
            .collect()
    }

    /// Label every admission and drop birth and in-hospital death admissions
    pub fn label(&self, mut raw: Vec<RawAdmission>) -> LabelingOutcome {
        let start = Instant::now();
        raw.sort_by(admission_order);

        let patients: Vec<&[RawAdmission]> = raw
            .chunk_by(|a, b| a.subject_id == b.subject_id)
            .collect();

        let pb = create_main_progress_bar(patients.len() as u64, Some("Labeling admissions"));
        let labeled: Vec<Admission> = patients
            .par_iter()
            .flat_map_iter(|rows| {
                let admissions = self.label_patient(rows);
                pb.inc(1);
                admissions
            })
            .collect();
        finish_progress_bar(&pb, Some("Labeling complete"));

        let mut outcome = LabelingOutcome::default();
        for admission in labeled {
            if admission.is_newborn() {
                outcome.excluded_newborn += 1;
            } else if admission.is_deceased() {
                outcome.excluded_deceased += 1;
            } else {
                outcome.admissions.push(admission);
            }
        }

        log::info!(
            "Labeled {} admissions of {} patients: {} readmitted, {} newborn and {} deceased excluded",
            outcome.admissions.len(),
            patients.len(),
            outcome.readmitted(),
            outcome.excluded_newborn,
            outcome.excluded_deceased
        );
        log_stage_complete("Admission labeling", outcome.admissions.len(), start.elapsed());
        outcome
    }
}
