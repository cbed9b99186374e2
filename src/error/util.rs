//! Utility functions for error handling
//!
//! Path checks that produce errors carrying the offending path and the
//! reason the path was needed.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{PrepError, Result};

/// Safely open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    require_file(path, purpose)?;
    fs::File::open(path).map_err(|e| PrepError::io_at(path, e))
}

/// Check that an input file exists and is a regular file
pub fn require_file(path: &Path, purpose: &str) -> Result<()> {
    if !path.is_file() {
        return Err(PrepError::MissingInput {
            purpose: purpose.to_string(),
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Make sure `path` is a usable output directory, creating it if needed
///
/// Fails when something other than a directory already occupies the path.
pub fn ensure_output_directory(path: &Path, purpose: &str) -> Result<()> {
    if path.exists() && !path.is_dir() {
        return Err(PrepError::OutputConflict(format!(
            "{} exists and is not a directory (needed for {purpose})",
            path.display()
        )));
    }

    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Err(PrepError::OutputConflict(
            format!("permission denied creating {} for {purpose}", path.display()),
        )),
        Err(e) => Err(PrepError::io_at(path, e)),
    }
}
