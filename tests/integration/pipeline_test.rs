use std::collections::BTreeSet;
use std::fs;

use readmit_prep::run_from_config;

use crate::utils::{
    Fixture, NEGATIVE_ADMISSIONS, POSITIVE_ADMISSIONS, admission_ids, read_column,
};

const WINDOWS: [&str; 3] = ["discharge", "3days", "2days"];
const SPLITS: [&str; 3] = ["train", "val", "test"];

#[tokio::test]
async fn test_pipeline_writes_every_split() {
    let fixture = Fixture::new();
    let summary = run_from_config(fixture.config()).await.unwrap();

    assert_eq!(summary.admissions, POSITIVE_ADMISSIONS + NEGATIVE_ADMISSIONS);
    assert_eq!(summary.readmitted, POSITIVE_ADMISSIONS);
    assert_eq!(summary.excluded_newborn, 1);
    assert_eq!(summary.excluded_deceased, 1);
    assert_eq!(summary.train_admissions, 16);
    assert_eq!(summary.val_admissions, 2);
    assert_eq!(summary.test_admissions, 2);
    assert_eq!(summary.reserve_pool, NEGATIVE_ADMISSIONS - POSITIVE_ADMISSIONS);

    for window in WINDOWS {
        for split in SPLITS {
            let path = fixture.split_path(window, split);
            assert!(path.is_file(), "{} missing", path.display());
        }
    }
    assert!(fixture.output_dir().join("split_summary.json").is_file());
    assert!(!fixture.output_dir().join("admissions.csv").exists());
}

#[tokio::test]
async fn test_discharge_splits_are_balanced_and_disjoint() {
    let fixture = Fixture::new();
    run_from_config(fixture.config()).await.unwrap();

    // Three chunks per discharge summary; training adds two reserve admissions
    let train = fixture.split_path("discharge", "train");
    let val = fixture.split_path("discharge", "val");
    let test = fixture.split_path("discharge", "test");
    assert_eq!(read_column(&train, "TEXT").len(), (16 + 2) * 3);
    assert_eq!(read_column(&val, "TEXT").len(), 6);
    assert_eq!(read_column(&test, "TEXT").len(), 6);

    for path in [&val, &test] {
        let labels = read_column(path, "Label");
        assert_eq!(labels.iter().filter(|label| *label == "1").count(), 3);
        assert_eq!(labels.iter().filter(|label| *label == "0").count(), 3);
    }

    let train_ids = admission_ids(&train);
    let val_ids = admission_ids(&val);
    let test_ids = admission_ids(&test);
    assert_eq!(train_ids.len(), 18);
    assert!(train_ids.is_disjoint(&val_ids));
    assert!(train_ids.is_disjoint(&test_ids));
    assert!(val_ids.is_disjoint(&test_ids));

    // Excluded admissions never appear
    let all: BTreeSet<i64> = train_ids.union(&val_ids).chain(&test_ids).copied().collect();
    assert!(!all.contains(&2101));
    assert!(!all.contains(&2201));
}

#[tokio::test]
async fn test_admission_split_is_shared_across_windows() {
    let fixture = Fixture::new();
    run_from_config(fixture.config()).await.unwrap();

    let discharge_val = admission_ids(&fixture.split_path("discharge", "val"));
    for window in ["3days", "2days"] {
        let val = admission_ids(&fixture.split_path(window, "val"));
        assert!(val.is_subset(&discharge_val), "{window} validation leaked");
        let train = admission_ids(&fixture.split_path(window, "train"));
        assert!(train.is_disjoint(&discharge_val));
    }
}

#[tokio::test]
async fn test_early_windows_filter_short_stays() {
    let fixture = Fixture::new();
    run_from_config(fixture.config()).await.unwrap();

    for (window, min_days) in [("3days", 3.0), ("2days", 2.0)] {
        for split in ["val", "test"] {
            for duration in read_column(&fixture.split_path(window, split), "DURATION") {
                let duration: f64 = duration.parse().unwrap();
                assert!(duration >= min_days, "{window}/{split} kept a {duration} day stay");
            }
        }
    }

    // Every 2-day admission contributes only its admission-day note: 318 + 82 words
    let val = read_column(&fixture.split_path("2days", "val"), "TEXT");
    assert_eq!(val.len(), 4);
    assert!(val.iter().all(|text| text.starts_with("early")));
}

#[tokio::test]
async fn test_chunk_rows_carry_admission_codes() {
    let fixture = Fixture::new();
    run_from_config(fixture.config()).await.unwrap();
    let path = fixture.split_path("discharge", "train");

    let column = |name: &str| read_column(&path, name);
    let all_equal = |name: &str, expected: &str| {
        assert!(
            column(name).iter().all(|value| value == expected),
            "unexpected {name} values"
        );
    };
    all_equal("DIAG_ICD9", "['D_4019', 'D_25000']");
    all_equal("SMALL_DIAG_ICD9", "['D_401', 'D_250']");
    all_equal("DIAG_CCS", "['98', '49']");
    all_equal("PROC_ICD9", "['P_3893']");
    all_equal("SMALL_PROC_ICD9", "['P_38']");
    all_equal("PROC_CCS", "['216']");
    all_equal("NDC", "['2']");
    all_equal("CUI", "['C0001']");

    // A readmitted stay always has a following admission in the table
    for (label, next) in column("Label").iter().zip(column("NEXT_DIAG_CCS")) {
        if label == "1" {
            assert_eq!(next, "['98', '49']");
        }
    }
    for text in column("TEXT") {
        assert!(text.split_whitespace().count() <= 318);
    }
}

#[tokio::test]
async fn test_runs_are_reproducible() {
    let fixture = Fixture::new();
    run_from_config(fixture.config()).await.unwrap();

    let mut second = fixture.config();
    second.output_dir = fixture.dir.path().join("second");
    run_from_config(second).await.unwrap();

    for window in WINDOWS {
        for split in SPLITS {
            let file = format!("{split}.csv");
            let first = fs::read(fixture.output_dir().join(window).join(&file)).unwrap();
            let again = fs::read(fixture.dir.path().join("second").join(window).join(&file)).unwrap();
            assert_eq!(first, again, "{window}/{file} differs between runs");
        }
    }
}

#[tokio::test]
async fn test_admission_table_is_optional_output() {
    let fixture = Fixture::new();
    let mut config = fixture.config();
    config.write_admissions = true;
    run_from_config(config).await.unwrap();

    let path = fixture.output_dir().join("admissions.csv");
    let labels = read_column(&path, "OUTPUT_LABEL");
    assert_eq!(labels.len(), POSITIVE_ADMISSIONS + NEGATIVE_ADMISSIONS);
    assert_eq!(labels.iter().filter(|label| *label == "1").count(), POSITIVE_ADMISSIONS);

    let summary: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(fixture.output_dir().join("split_summary.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(summary["windows"].as_array().unwrap().len(), 3);
    // Two usable values per stay, excluded stays included
    assert_eq!(summary["medication_mapping"]["mapped"], 2 * 34);
}
