use std::fs;

use readmit_prep::{PrepError, preflight, run_from_config};

use crate::utils::Fixture;

#[test]
fn test_preflight_accepts_fresh_fixture() {
    let fixture = Fixture::new();
    preflight(&fixture.config()).unwrap();
}

#[test]
fn test_missing_input_is_reported_with_purpose() {
    let fixture = Fixture::new();
    fs::remove_file(fixture.data_dir().join("NOTEEVENTS.csv")).unwrap();

    match preflight(&fixture.config()) {
        Err(PrepError::MissingInput { purpose, path }) => {
            assert_eq!(purpose, "notes table");
            assert!(path.ends_with("NOTEEVENTS.csv.gz"));
        }
        other => panic!("expected a missing input error, got {other:?}"),
    }
}

#[test]
fn test_gzip_tables_are_found() {
    let fixture = Fixture::new();
    let plain = fixture.data_dir().join("PRESCRIPTIONS.csv");
    let compressed = fixture.data_dir().join("PRESCRIPTIONS.csv.gz");

    let mut encoder = flate2::write::GzEncoder::new(
        fs::File::create(&compressed).unwrap(),
        flate2::Compression::default(),
    );
    std::io::copy(&mut fs::File::open(&plain).unwrap(), &mut encoder).unwrap();
    encoder.finish().unwrap();
    fs::remove_file(&plain).unwrap();

    let config = fixture.config();
    assert_eq!(config.inputs.prescriptions, compressed);
    preflight(&config).unwrap();
}

#[test]
fn test_output_path_occupied_by_file() {
    let fixture = Fixture::new();
    fs::write(fixture.output_dir(), "not a directory").unwrap();
    assert!(matches!(
        preflight(&fixture.config()),
        Err(PrepError::OutputConflict(_))
    ));
}

#[tokio::test]
async fn test_existing_splits_need_overwrite() {
    let fixture = Fixture::new();
    run_from_config(fixture.config()).await.unwrap();
    let train = fixture.split_path("discharge", "train");
    let written = fs::read(&train).unwrap();

    let err = run_from_config(fixture.config()).await.unwrap_err();
    assert!(matches!(err, PrepError::OutputConflict(_)));
    assert_eq!(fs::read(&train).unwrap(), written);

    let mut config = fixture.config();
    config.overwrite = true;
    run_from_config(config).await.unwrap();
    assert_eq!(fs::read(&train).unwrap(), written);
}

#[tokio::test]
async fn test_too_few_negatives_fails_before_writing() {
    let fixture = Fixture::new();
    let admissions = fixture.data_dir().join("ADMISSIONS.csv");
    // Keep only the two-stay patients and give the last one a third stay,
    // so eleven readmissions face ten other admissions
    let content = fs::read_to_string(&admissions).unwrap();
    let mut kept: Vec<&str> = content.lines().take(21).collect();
    kept.push("99,10,1003,2150-01-25 08:00:00,2150-01-27 08:00:00,,URGENT");
    fs::write(&admissions, kept.join("\n")).unwrap();

    let err = run_from_config(fixture.config()).await.unwrap_err();
    assert!(matches!(
        err,
        PrepError::InsufficientSamples {
            needed: 11,
            available: 10,
            ..
        }
    ));
    assert!(!fixture.split_path("discharge", "train").exists());
}
