//! Admission entity model
//!
//! One hospital stay, as read from the admissions table, plus the fields the
//! labeler derives from the patient's chronological admission sequence.

use chrono::NaiveDateTime;
use std::fmt;

/// Patient identifier (`SUBJECT_ID`)
pub type PatientId = i64;

/// Hospital admission identifier (`HADM_ID`)
pub type AdmissionId = i64;

const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Admission type as recorded at intake
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AdmissionType {
    /// Scheduled stay; never counts as the event that triggers a readmission
    Elective,
    /// Emergency admission
    Emergency,
    /// Urgent admission
    Urgent,
    /// Birth admission; excluded from the final dataset
    Newborn,
    /// Any other recorded value
    Other(String),
}

impl AdmissionType {
    /// The value as written in the source table
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Elective => "ELECTIVE",
            Self::Emergency => "EMERGENCY",
            Self::Urgent => "URGENT",
            Self::Newborn => "NEWBORN",
            Self::Other(value) => value,
        }
    }
}

impl From<&str> for AdmissionType {
    fn from(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "ELECTIVE" => Self::Elective,
            "EMERGENCY" => Self::Emergency,
            "URGENT" => Self::Urgent,
            "NEWBORN" => Self::Newborn,
            _ => Self::Other(s.trim().to_string()),
        }
    }
}

impl fmt::Display for AdmissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An admission record as read from the admissions table
#[derive(Debug, Clone, PartialEq)]
pub struct RawAdmission {
    /// Patient identifier
    pub subject_id: PatientId,
    /// Admission identifier
    pub hadm_id: AdmissionId,
    /// Admission time; `None` when missing or unparseable
    pub admit_time: Option<NaiveDateTime>,
    /// Discharge time; `None` when missing or unparseable
    pub discharge_time: Option<NaiveDateTime>,
    /// In-hospital death time
    pub death_time: Option<NaiveDateTime>,
    /// Admission type
    pub admission_type: Option<AdmissionType>,
}

impl RawAdmission {
    /// Create a new raw admission without a death time
    #[must_use]
    pub fn new(
        subject_id: PatientId,
        hadm_id: AdmissionId,
        admit_time: Option<NaiveDateTime>,
        discharge_time: Option<NaiveDateTime>,
        admission_type: AdmissionType,
    ) -> Self {
        Self {
            subject_id,
            hadm_id,
            admit_time,
            discharge_time,
            death_time: None,
            admission_type: Some(admission_type),
        }
    }

    /// Set the death time
    #[must_use]
    pub fn with_death_time(mut self, death_time: NaiveDateTime) -> Self {
        self.death_time = Some(death_time);
        self
    }
}

/// A labeled admission with its temporal links
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    /// Patient identifier
    pub subject_id: PatientId,
    /// Admission identifier
    pub hadm_id: AdmissionId,
    /// Admission time
    pub admit_time: Option<NaiveDateTime>,
    /// Discharge time
    pub discharge_time: Option<NaiveDateTime>,
    /// In-hospital death time
    pub death_time: Option<NaiveDateTime>,
    /// Admission type
    pub admission_type: Option<AdmissionType>,
    /// Admission time of the next non-elective admission
    pub next_admit_time: Option<NaiveDateTime>,
    /// Type of the next non-elective admission
    pub next_admission_type: Option<AdmissionType>,
    /// Discharge time of the previous admission
    pub prev_discharge_time: Option<NaiveDateTime>,
    /// Type of the previous admission
    pub prev_admission_type: Option<AdmissionType>,
    /// Days between this discharge and the next admission
    pub days_to_next_admit: Option<f64>,
    /// Days between the previous discharge and this admission
    pub days_since_prev_admit: Option<f64>,
    /// Length of stay in days
    pub duration: Option<f64>,
    /// Whether the patient was readmitted within the readmission window
    pub readmitted: bool,
}

impl Admission {
    /// Start a labeled admission from a raw record with no derived fields set
    #[must_use]
    pub fn from_raw(raw: &RawAdmission) -> Self {
        Self {
            subject_id: raw.subject_id,
            hadm_id: raw.hadm_id,
            admit_time: raw.admit_time,
            discharge_time: raw.discharge_time,
            death_time: raw.death_time,
            admission_type: raw.admission_type.clone(),
            next_admit_time: None,
            next_admission_type: None,
            prev_discharge_time: None,
            prev_admission_type: None,
            days_to_next_admit: None,
            days_since_prev_admit: None,
            duration: days_between(raw.discharge_time, raw.admit_time),
            readmitted: false,
        }
    }

    /// Binary label as written to the datasets
    #[must_use]
    pub const fn label(&self) -> u8 {
        if self.readmitted { 1 } else { 0 }
    }

    /// Whether this admission is a birth admission
    #[must_use]
    pub fn is_newborn(&self) -> bool {
        self.admission_type == Some(AdmissionType::Newborn)
    }

    /// Whether the patient died during this admission
    #[must_use]
    pub const fn is_deceased(&self) -> bool {
        self.death_time.is_some()
    }

    /// Whether the admission is dropped from the final dataset
    #[must_use]
    pub fn is_excluded(&self) -> bool {
        self.is_newborn() || self.is_deceased()
    }

    /// Whether the stay lasted at least `days` days; unknown durations never qualify
    #[must_use]
    pub fn stayed_at_least(&self, days: f64) -> bool {
        self.duration.is_some_and(|duration| duration >= days)
    }
}

/// Signed difference `later - earlier` in fractional days
#[must_use]
pub fn days_between(later: Option<NaiveDateTime>, earlier: Option<NaiveDateTime>) -> Option<f64> {
    let (later, earlier) = (later?, earlier?);
    Some((later - earlier).num_milliseconds() as f64 / MILLIS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2150, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_admission_type_parsing() {
        assert_eq!(AdmissionType::from("ELECTIVE"), AdmissionType::Elective);
        assert_eq!(AdmissionType::from(" newborn "), AdmissionType::Newborn);
        assert_eq!(
            AdmissionType::from("TRANSFER"),
            AdmissionType::Other("TRANSFER".to_string())
        );
        assert_eq!(AdmissionType::Urgent.to_string(), "URGENT");
    }

    #[test]
    fn test_days_between_is_fractional() {
        assert_eq!(days_between(Some(at(3, 12)), Some(at(1, 0))), Some(2.5));
        assert_eq!(days_between(Some(at(1, 0)), Some(at(2, 0))), Some(-1.0));
        assert_eq!(days_between(None, Some(at(1, 0))), None);
    }

    #[test]
    fn test_exclusion_rules() {
        let raw = RawAdmission::new(1, 10, Some(at(1, 0)), Some(at(4, 0)), AdmissionType::Emergency);
        let admission = Admission::from_raw(&raw);
        assert!(!admission.is_excluded());
        assert_eq!(admission.duration, Some(3.0));
        assert!(admission.stayed_at_least(3.0));
        assert!(!admission.stayed_at_least(3.5));

        let deceased = Admission::from_raw(&raw.clone().with_death_time(at(4, 0)));
        assert!(deceased.is_excluded());

        let newborn = RawAdmission::new(2, 11, None, None, AdmissionType::Newborn);
        assert!(Admission::from_raw(&newborn).is_excluded());
    }
}
