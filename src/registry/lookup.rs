//! Reference code tables
//!
//! JSON objects mapping one code system to another (ICD to CCS group, ICD to
//! description, NDC to concept). Values may be stored as strings or numbers;
//! both are read as strings.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::error::{PrepError, Result};
use crate::utils::logging::{log_operation_complete, log_operation_start, log_warning};

/// Code-to-code lookup table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTable {
    entries: FxHashMap<String, String>,
}

impl CodeTable {
    /// Load a table from a JSON object file
    pub fn load(path: &Path) -> Result<Self> {
        log_operation_start("Loading code table", path);
        let file = File::open(path).map_err(|e| PrepError::io_at(path, e))?;
        let raw: FxHashMap<String, Value> =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| PrepError::json(path, e))?;

        let mut skipped = 0usize;
        let entries = raw
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::String(text) => Some((key, text)),
                Value::Number(number) => Some((key, number.to_string())),
                _ => {
                    skipped += 1;
                    None
                }
            })
            .collect::<FxHashMap<_, _>>();

        if skipped > 0 {
            log_warning(
                &format!("Ignored {skipped} entries that are neither strings nor numbers"),
                Some(path),
            );
        }
        log_operation_complete("loaded", path, entries.len(), None);
        Ok(Self { entries })
    }

    /// Value stored for `code`
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(String::as_str)
    }

    /// Whether `code` is a key of the table
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    /// All keys, in no particular order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// All values, in no particular order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CodeTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}
