use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use readmit_prep::utils::arrow::array_utils::string_column;
use readmit_prep::utils::arrow::extractors::extract_string;
use readmit_prep::utils::io::read_table;
use readmit_prep::{InputPaths, PipelineConfig};
use tempfile::TempDir;

/// Words in every discharge summary; cut into 318 + 318 + 64
pub const DISCHARGE_WORDS: usize = 700;

/// Words in every admission-day nursing note; cut into 318 + 82
pub const EARLY_WORDS: usize = 400;

/// Patients whose first stay is followed by a readmission 10 days later
pub const READMITTED_PATIENTS: RangeInclusive<i64> = 1..=10;

/// Patients with a single 2.5 day stay
pub const SINGLE_STAY_PATIENTS: RangeInclusive<i64> = 11..=20;

/// Admissions labeled readmitted
pub const POSITIVE_ADMISSIONS: usize = 10;

/// Admissions kept and labeled not readmitted
pub const NEGATIVE_ADMISSIONS: usize = 22;

struct Stay {
    subject: i64,
    hadm: i64,
    admit: String,
    discharge: String,
    death: &'static str,
    kind: &'static str,
}

impl Stay {
    fn new(subject: i64, hadm: i64, admit_day: u32, discharge_day: u32, kind: &'static str) -> Self {
        Self {
            subject,
            hadm,
            admit: format!("2150-01-{admit_day:02} 08:00:00"),
            discharge: format!("2150-01-{discharge_day:02} 08:00:00"),
            death: "",
            kind,
        }
    }
}

/// A MIMIC-shaped data directory in a temporary folder
///
/// Patients 1-10 are admitted twice and the first stay counts as readmitted.
/// Patients 11-20 have one short stay. Patient 21 is a newborn, patient 22
/// dies in hospital and patient 23 has an elective follow-up stay.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let fixture = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        fs::create_dir_all(fixture.data_dir()).unwrap();
        fs::create_dir_all(fixture.mappings_dir().join("ICDandCCSmappings")).unwrap();
        fs::create_dir_all(fixture.mappings_dir().join("NDCmappings")).unwrap();
        fixture.write_tables();
        fixture.write_mappings();
        fixture
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("mimic")
    }

    pub fn mappings_dir(&self) -> PathBuf {
        self.dir.path().join("extended")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("output")
    }

    pub fn vocab_dir(&self) -> PathBuf {
        self.dir.path().join("vocab")
    }

    pub fn inputs(&self) -> InputPaths {
        InputPaths::from_data_dir(&self.data_dir(), &self.mappings_dir())
    }

    /// Configuration with reserve draws small enough for the fixture
    pub fn config(&self) -> PipelineConfig {
        PipelineConfig::builder()
            .inputs(self.inputs())
            .output_dir(self.output_dir())
            .vocabulary_dir(self.vocab_dir())
            .reserve_sizes(2, 2)
            .build()
    }

    /// Path of one written split
    pub fn split_path(&self, window: &str, split: &str) -> PathBuf {
        self.output_dir().join(window).join(format!("{split}.csv"))
    }

    fn stays() -> Vec<Stay> {
        let mut stays = Vec::new();
        for subject in READMITTED_PATIENTS {
            stays.push(Stay::new(subject, subject * 100 + 1, 1, 6, "EMERGENCY"));
            stays.push(Stay::new(subject, subject * 100 + 2, 16, 21, "URGENT"));
        }
        for subject in SINGLE_STAY_PATIENTS {
            let mut stay = Stay::new(subject, subject * 100 + 1, 1, 3, "EMERGENCY");
            stay.discharge = "2150-01-03 20:00:00".to_string();
            stays.push(stay);
        }
        stays.push(Stay::new(21, 2101, 1, 4, "NEWBORN"));
        let mut died = Stay::new(22, 2201, 1, 6, "EMERGENCY");
        died.death = "2150-01-06 08:00:00";
        stays.push(died);
        stays.push(Stay::new(23, 2301, 1, 6, "EMERGENCY"));
        stays.push(Stay::new(23, 2302, 11, 16, "ELECTIVE"));
        stays
    }

    fn write_tables(&self) {
        let mut admissions = String::from(
            "ROW_ID,SUBJECT_ID,HADM_ID,ADMITTIME,DISCHTIME,DEATHTIME,ADMISSION_TYPE\n",
        );
        let mut diagnoses = String::from("ROW_ID,SUBJECT_ID,HADM_ID,SEQ_NUM,ICD9_CODE\n");
        let mut procedures = String::from("ROW_ID,SUBJECT_ID,HADM_ID,SEQ_NUM,ICD9_CODE\n");
        let mut prescriptions = String::from("ROW_ID,SUBJECT_ID,HADM_ID,STARTDATE,NDC\n");
        let mut notes =
            String::from("ROW_ID,SUBJECT_ID,HADM_ID,CHARTDATE,CHARTTIME,CATEGORY,TEXT\n");

        for (row, stay) in Self::stays().iter().enumerate() {
            let (subject, hadm) = (stay.subject, stay.hadm);
            writeln!(
                admissions,
                "{row},{subject},{hadm},{},{},{},{}",
                stay.admit, stay.discharge, stay.death, stay.kind
            )
            .unwrap();

            // Sequence numbers out of order; the empty code is dropped
            writeln!(diagnoses, "{row},{subject},{hadm},2,25000").unwrap();
            writeln!(diagnoses, "{row},{subject},{hadm},1,4019").unwrap();
            writeln!(diagnoses, "{row},{subject},{hadm},3,").unwrap();
            writeln!(procedures, "{row},{subject},{hadm},1,3893").unwrap();

            let admit_date = &stay.admit[..10];
            let discharge_date = &stay.discharge[..10];
            for ndc in ["00002", "2", "0", "", "999"] {
                writeln!(prescriptions, "{row},{subject},{hadm},{admit_date} 00:00:00,{ndc}")
                    .unwrap();
            }

            writeln!(
                notes,
                "{row},{subject},{hadm},{admit_date},{admit_date} 12:00:00,Nursing/other,\"{}\"",
                note_text("early", EARLY_WORDS)
            )
            .unwrap();
            writeln!(
                notes,
                "{row},{subject},{hadm},{discharge_date},,Discharge summary,\"{}\"",
                note_text("summary", DISCHARGE_WORDS)
            )
            .unwrap();
        }
        // Outpatient note without an admission id
        writeln!(notes, "999,1,,2150-01-02,,Radiology,\"outpatient scan\"").unwrap();

        let data = self.data_dir();
        fs::write(data.join("ADMISSIONS.csv"), admissions).unwrap();
        fs::write(data.join("DIAGNOSES_ICD.csv"), diagnoses).unwrap();
        fs::write(data.join("PROCEDURES_ICD.csv"), procedures).unwrap();
        fs::write(data.join("PRESCRIPTIONS.csv"), prescriptions).unwrap();
        fs::write(data.join("NOTEEVENTS.csv"), notes).unwrap();
    }

    fn write_mappings(&self) {
        let icd = self.mappings_dir().join("ICDandCCSmappings");
        fs::write(
            icd.join("merged_icdccs_codes.json"),
            r#"{"D_4019": "98", "D_25000": "49", "P_3893": " 216 "}"#,
        )
        .unwrap();
        fs::write(
            icd.join("merged_icd_text.json"),
            r#"{"D_4019": "hypertension", "D_25000": "diabetes", "D_E8501": "accident", "P_3893": "venous catheter"}"#,
        )
        .unwrap();
        fs::write(
            self.mappings_dir().join("NDCmappings").join("ndc_cui_map.json"),
            r#"{"2": "C0001", "456": "C0002"}"#,
        )
        .unwrap();
    }
}

/// Note text of `words` distinct lowercase words
pub fn note_text(tag: &str, words: usize) -> String {
    (0..words)
        .map(|i| format!("{tag}{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Every value of `column` in a written dataset, missing values as empty strings
pub fn read_column(path: &Path, column: &str) -> Vec<String> {
    read_table(path, "dataset", &[column])
        .unwrap()
        .iter()
        .flat_map(|batch| {
            let values = string_column(batch, "dataset", column).unwrap();
            (0..batch.num_rows())
                .map(|row| extract_string(values, row).unwrap_or_default())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Distinct admission ids of a written dataset
pub fn admission_ids(path: &Path) -> BTreeSet<i64> {
    read_column(path, "HADM_ID")
        .iter()
        .map(|id| id.parse().unwrap())
        .collect()
}
