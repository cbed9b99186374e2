//! Code vocabularies
//!
//! A vocabulary maps categorical codes to stable integer indices. Index 0 is
//! reserved for the padding/unknown code `"0"`; every other code receives the
//! next unused index in the order it is first seen.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{PrepError, Result};

/// Code reserved for padding and unknown values
pub const PADDING_CODE: &str = "0";

/// Index of [`PADDING_CODE`]
pub const PADDING_INDEX: u32 = 0;

/// Ordered mapping from code to index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    entries: Vec<(String, u32)>,
    positions: FxHashMap<String, usize>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

impl Vocabulary {
    /// Vocabulary holding only the padding code
    #[must_use]
    pub fn new() -> Self {
        let mut vocabulary = Self::empty();
        vocabulary.insert_or_replace(PADDING_CODE.to_string(), PADDING_INDEX);
        vocabulary
    }

    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            positions: FxHashMap::default(),
        }
    }

    /// Build a vocabulary over `codes`, in iteration order
    ///
    /// Codes already present (including repeated codes and `"0"`) keep their
    /// first index, so callers control the assignment through the order they
    /// pass codes in.
    pub fn build<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocabulary = Self::new();
        let mut next_index = PADDING_INDEX + 1;
        for code in codes {
            let code = code.into();
            if vocabulary.contains(&code) {
                continue;
            }
            vocabulary.insert_or_replace(code, next_index);
            next_index += 1;
        }
        vocabulary
    }

    fn insert_or_replace(&mut self, code: String, index: u32) {
        if let Some(&position) = self.positions.get(&code) {
            self.entries[position].1 = index;
        } else {
            self.positions.insert(code.clone(), self.entries.len());
            self.entries.push((code, index));
        }
    }

    /// Index assigned to `code`
    #[must_use]
    pub fn index_of(&self, code: &str) -> Option<u32> {
        self.positions
            .get(code)
            .map(|&position| self.entries[position].1)
    }

    /// Whether `code` has an index
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.positions.contains_key(code)
    }

    /// Number of codes, padding included
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the vocabulary has no codes at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries
            .iter()
            .map(|(code, index)| (code.as_str(), *index))
    }

    /// Overlay `base` on this vocabulary: entries of `base` win on collision
    ///
    /// Codes only present here keep their own index, even if `base` already
    /// uses that index for another code.
    pub fn merge_existing(&mut self, base: Self) {
        for (code, index) in base.entries {
            self.insert_or_replace(code, index);
        }
    }

    /// Read a vocabulary from a JSON object file
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| PrepError::io_at(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| PrepError::json(path, e))
    }

    /// Write the vocabulary as a JSON object, replacing any existing file
    pub fn write(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| PrepError::io_at(path, e))?;
        self.write_to(BufWriter::new(file), path)
    }

    pub(crate) fn write_to<W: Write>(&self, mut writer: W, path: &Path) -> Result<()> {
        serde_json::to_writer(&mut writer, self).map_err(|e| PrepError::json(path, e))?;
        writer.flush().map_err(|e| PrepError::io_at(path, e))
    }

    /// Write the vocabulary, merging with an existing file at `path`
    ///
    /// Entries already stored in the file win. Returns the merged vocabulary.
    pub fn persist(mut self, path: &Path) -> Result<Self> {
        if path.is_file() {
            let base = Self::load(path)?;
            self.merge_existing(base);
            log::info!(
                "Added content to previously existing vocabulary at {}",
                path.display()
            );
        }
        self.write(path)?;
        Ok(self)
    }
}

impl Serialize for Vocabulary {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (code, index) in &self.entries {
            map.serialize_entry(code, index)?;
        }
        map.end()
    }
}

struct VocabularyVisitor;

impl<'de> Visitor<'de> for VocabularyVisitor {
    type Value = Vocabulary;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map from code to index")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Vocabulary, A::Error> {
        let mut vocabulary = Vocabulary::empty();
        while let Some((code, index)) = access.next_entry::<String, u32>()? {
            vocabulary.insert_or_replace(code, index);
        }
        Ok(vocabulary)
    }
}

impl<'de> Deserialize<'de> for Vocabulary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(VocabularyVisitor)
    }
}
