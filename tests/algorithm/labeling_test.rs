use chrono::{NaiveDate, NaiveDateTime};
use readmit_prep::AdmissionLabeler;
use readmit_prep::models::{AdmissionType, RawAdmission};

fn at(month: u32, day: u32, hour: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2150, month, day).and_then(|date| date.and_hms_opt(hour, 0, 0))
}

#[test]
fn test_thirty_day_boundary() {
    let raw = vec![
        RawAdmission::new(1, 10, at(1, 1, 0), at(1, 2, 0), AdmissionType::Emergency),
        // Exactly 30 days after discharge: not a readmission
        RawAdmission::new(1, 11, at(2, 1, 0), at(2, 3, 0), AdmissionType::Emergency),
        // 29.5 days after discharge
        RawAdmission::new(1, 12, at(3, 4, 12), at(3, 5, 0), AdmissionType::Urgent),
    ];
    let outcome = AdmissionLabeler::default().label(raw);
    let labels: Vec<_> = outcome.admissions.iter().map(|a| a.label()).collect();
    assert_eq!(labels, vec![0, 1, 0]);
    assert_eq!(outcome.admissions[0].days_to_next_admit, Some(30.0));
    assert_eq!(outcome.admissions[1].days_to_next_admit, Some(29.5));
    assert_eq!(outcome.readmitted(), 1);
}

#[test]
fn test_patients_are_labeled_independently() {
    let raw = vec![
        RawAdmission::new(2, 20, at(1, 10, 0), at(1, 12, 0), AdmissionType::Emergency),
        RawAdmission::new(1, 10, at(1, 1, 0), at(1, 2, 0), AdmissionType::Emergency),
    ];
    let outcome = AdmissionLabeler::default().label(raw);
    assert_eq!(outcome.admissions.len(), 2);
    assert!(outcome.admissions.iter().all(|a| !a.readmitted));
    assert!(outcome.admissions.iter().all(|a| a.next_admit_time.is_none()));
    assert_eq!(outcome.admissions[0].subject_id, 1);
}

#[test]
fn test_elective_chain_links_to_first_unplanned_stay() {
    let raw = vec![
        RawAdmission::new(1, 10, at(1, 1, 0), at(1, 3, 0), AdmissionType::Emergency),
        RawAdmission::new(1, 11, at(1, 5, 0), at(1, 6, 0), AdmissionType::Elective),
        RawAdmission::new(1, 12, at(1, 8, 0), at(1, 9, 0), AdmissionType::Elective),
        RawAdmission::new(1, 13, at(3, 1, 0), at(3, 2, 0), AdmissionType::Emergency),
    ];
    let outcome = AdmissionLabeler::default().label(raw);
    let first = &outcome.admissions[0];
    assert_eq!(first.next_admit_time, at(3, 1, 0));
    assert_eq!(first.next_admission_type, Some(AdmissionType::Emergency));
    assert!(!first.readmitted);

    // Elective stays link forward to the same unplanned stay
    for admission in &outcome.admissions[..3] {
        assert_eq!(admission.next_admit_time, at(3, 1, 0));
    }
    assert_eq!(outcome.admissions[3].next_admit_time, None);
}

#[test]
fn test_custom_window_and_missing_times() {
    let raw = vec![
        RawAdmission::new(1, 10, at(1, 1, 0), None, AdmissionType::Emergency),
        RawAdmission::new(1, 11, at(1, 20, 0), at(1, 21, 0), AdmissionType::Emergency),
        RawAdmission::new(1, 12, None, at(1, 25, 0), AdmissionType::Emergency),
    ];
    let outcome = AdmissionLabeler::new(7.0).label(raw);
    let ids: Vec<_> = outcome.admissions.iter().map(|a| a.hadm_id).collect();
    // Missing admission times sort last
    assert_eq!(ids, vec![10, 11, 12]);
    // Missing discharge time: the gap is unknown and the label is 0
    assert_eq!(outcome.admissions[0].days_to_next_admit, None);
    assert!(!outcome.admissions[0].readmitted);
    assert_eq!(outcome.admissions[0].duration, None);
    assert_eq!(outcome.admissions[1].days_to_next_admit, None);
}
