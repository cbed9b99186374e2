use std::sync::Arc;

use chrono::NaiveDate;
use readmit_prep::models::{Admission, AdmissionRecord, AdmissionType, NoteChunk, RawAdmission};
use readmit_prep::{NoteWindow, SplitKind, SplitSampler};
use rustc_hash::FxHashSet;

fn admissions(positives: i64, negatives: i64) -> Vec<Admission> {
    let admit = NaiveDate::from_ymd_opt(2150, 1, 1).and_then(|date| date.and_hms_opt(0, 0, 0));
    let discharge = NaiveDate::from_ymd_opt(2150, 1, 6).and_then(|date| date.and_hms_opt(0, 0, 0));
    (0..positives + negatives)
        .map(|id| {
            let raw = RawAdmission::new(id, id, admit, discharge, AdmissionType::Emergency);
            let mut admission = Admission::from_raw(&raw);
            admission.readmitted = id < positives;
            admission
        })
        .collect()
}

#[test]
fn test_different_seeds_give_different_splits() {
    let cohort = admissions(40, 100);
    let first = SplitSampler::new(1, 0.2, 0.5).plan(&cohort).unwrap();
    let second = SplitSampler::new(2, 0.2, 0.5).plan(&cohort).unwrap();
    assert_ne!(first, second);
    assert_eq!(first.train.len(), second.train.len());
}

#[test]
fn test_reserve_chunks_join_training_only() {
    let cohort = admissions(10, 30);
    let sampler = SplitSampler::new(1, 0.2, 0.5);
    let plan = sampler.plan(&cohort).unwrap();
    assert_eq!(plan.reserve.len(), 20);

    let chunks: Vec<NoteChunk> = cohort
        .iter()
        .map(|admission| NoteChunk {
            record: Arc::new(AdmissionRecord::new(admission.clone())),
            text: format!("note {}", admission.hadm_id),
        })
        .collect();
    let splits = sampler.assemble(NoteWindow::DischargeSummary, &plan, 5, chunks);

    let reserve: FxHashSet<i64> = plan.reserve.iter().copied().collect();
    let train_reserve = splits
        .train
        .iter()
        .filter(|chunk| reserve.contains(&chunk.hadm_id()))
        .count();
    assert_eq!(train_reserve, 5);
    assert_eq!(splits.train.len(), plan.train.len() + 5);

    for kind in [SplitKind::Val, SplitKind::Test] {
        assert!(
            splits
                .chunks(kind)
                .iter()
                .all(|chunk| !reserve.contains(&chunk.hadm_id()))
        );
        assert_eq!(splits.chunks(kind).len(), plan.admissions(kind).len());
    }
}

#[test]
fn test_split_file_names() {
    let names: Vec<_> = SplitKind::ALL.iter().map(|kind| kind.file_name()).collect();
    assert_eq!(names, vec!["train.csv", "val.csv", "test.csv"]);
}
