use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use readmit_prep::{InputPaths, NoteWindow, PipelineConfig, run_from_config};

#[derive(Parser, Debug)]
#[command(
    about = "Build chunked 30-day readmission datasets from MIMIC-style tables",
    version
)]
struct Args {
    /// Directory with ADMISSIONS, DIAGNOSES_ICD, PROCEDURES_ICD, PRESCRIPTIONS and NOTEEVENTS
    #[arg(long = "data-dir", value_name = "DIR")]
    data_dir: PathBuf,

    /// Directory with the ICDandCCSmappings/ and NDCmappings/ reference tables
    #[arg(long = "mappings-dir", value_name = "DIR", default_value = "data/extended")]
    mappings_dir: PathBuf,

    /// Directory receiving one folder of splits per note window
    #[arg(long = "output-dir", value_name = "DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Directory holding the vocabulary files [default: the mappings directory]
    #[arg(long = "vocab-dir", value_name = "DIR")]
    vocab_dir: Option<PathBuf>,

    /// Seed for every random draw
    #[arg(long = "seed", default_value_t = 1)]
    seed: u64,

    /// Note windows to build, e.g. `discharge,3days,2days`
    #[arg(long = "windows", value_delimiter = ',', default_values_t = default_windows())]
    windows: Vec<NoteWindow>,

    /// Readmission window in days
    #[arg(long = "readmission-days", default_value_t = 30.0)]
    readmission_days: f64,

    /// Replace existing split files
    #[arg(long = "overwrite")]
    overwrite: bool,

    /// Also write the labeled admission table
    #[arg(long = "write-admissions")]
    write_admissions: bool,

    /// Admissions table, overriding the one found in the data directory
    #[arg(long = "admissions", value_name = "FILE")]
    admissions: Option<PathBuf>,

    /// Notes table, overriding the one found in the data directory
    #[arg(long = "notes", value_name = "FILE")]
    notes: Option<PathBuf>,
}

fn default_windows() -> Vec<NoteWindow> {
    PipelineConfig::default().windows
}

impl Args {
    fn into_config(self) -> PipelineConfig {
        let mut inputs = InputPaths::from_data_dir(&self.data_dir, &self.mappings_dir);
        if let Some(path) = self.admissions {
            inputs.admissions = path;
        }
        if let Some(path) = self.notes {
            inputs.notes = path;
        }

        PipelineConfig::builder()
            .inputs(inputs)
            .output_dir(self.output_dir)
            .vocabulary_dir(self.vocab_dir.unwrap_or(self.mappings_dir))
            .seed(self.seed)
            .windows(self.windows)
            .readmission_window_days(self.readmission_days)
            .overwrite(self.overwrite)
            .write_admissions(self.write_admissions)
            .build()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let start = Instant::now();
    let config = Args::parse().into_config();
    let output_dir = config.output_dir.clone();

    let summary = run_from_config(config)
        .await
        .context("Dataset preparation failed")?;

    info!(
        "Labeled {} admissions ({} readmitted); wrote {} note windows to {} in {:?}",
        summary.admissions,
        summary.readmitted,
        summary.windows.len(),
        output_dir.display(),
        start.elapsed()
    );
    Ok(())
}
