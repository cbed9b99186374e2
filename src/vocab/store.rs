//! Persistent vocabulary storage
//!
//! Vocabularies are shared across pipeline runs and must never be re-indexed
//! once written. Every access goes through [`VocabularyStore::get_or_create`]:
//! a stored vocabulary is returned as-is, and a missing one is built, written
//! and returned.

use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use rustc_hash::FxHashMap;
use tempfile::NamedTempFile;

use crate::error::util::ensure_output_directory;
use crate::error::{PrepError, Result};
use crate::vocab::vocabulary::Vocabulary;

/// The vocabularies produced by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VocabularyKind {
    /// Full diagnosis and procedure ICD codes
    Icd,
    /// Hierarchy-reduced ICD codes
    IcdHierarchy,
    /// CCS group codes
    Group,
    /// National Drug Codes
    Ndc,
    /// Drug concept identifiers
    Concept,
}

impl VocabularyKind {
    /// Every vocabulary kind
    pub const ALL: [Self; 5] = [
        Self::Icd,
        Self::IcdHierarchy,
        Self::Group,
        Self::Ndc,
        Self::Concept,
    ];

    /// File name used by file-backed stores
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Icd => "Icd9ToIdx.json",
            Self::IcdHierarchy => "smallIcd9ToIdx.json",
            Self::Group => "CCSToIdx.json",
            Self::Ndc => "NDCToIdx.json",
            Self::Concept => "cui_NDCToIdx.json",
        }
    }
}

/// A vocabulary together with whether this call created it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredVocabulary {
    /// The stored vocabulary
    pub vocabulary: Vocabulary,
    /// `true` when the vocabulary was built by this call
    pub created: bool,
}

/// Key-value store of vocabularies
pub trait VocabularyStore: Send + Sync {
    /// Return the stored vocabulary for `kind`, building and storing it with
    /// `build` if none exists yet
    fn get_or_create<F>(&self, kind: VocabularyKind, build: F) -> Result<StoredVocabulary>
    where
        F: FnOnce() -> Vocabulary;
}

/// Vocabulary store backed by JSON files in one directory
#[derive(Debug, Clone)]
pub struct FileVocabularyStore {
    dir: PathBuf,
}

impl FileVocabularyStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        ensure_output_directory(&dir, "vocabulary files")?;
        Ok(Self { dir })
    }

    /// Directory holding the vocabulary files
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the file for `kind`
    #[must_use]
    pub fn path_for(&self, kind: VocabularyKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    fn load_existing(path: &Path, kind: VocabularyKind) -> Result<StoredVocabulary> {
        log::info!(
            "{kind:?} vocabulary already stored at {}, skipping generation",
            path.display()
        );
        Ok(StoredVocabulary {
            vocabulary: Vocabulary::load(path)?,
            created: false,
        })
    }
}

impl VocabularyStore for FileVocabularyStore {
    fn get_or_create<F>(&self, kind: VocabularyKind, build: F) -> Result<StoredVocabulary>
    where
        F: FnOnce() -> Vocabulary,
    {
        let path = self.path_for(kind);
        if path.is_file() {
            return Self::load_existing(&path, kind);
        }

        let vocabulary = build();

        // Stage next to the target and refuse to clobber, so a concurrent
        // writer that got there first wins and its file is used instead.
        let mut staged =
            NamedTempFile::new_in(&self.dir).map_err(|e| PrepError::io_at(&self.dir, e))?;
        vocabulary.write_to(BufWriter::new(staged.as_file_mut()), &path)?;

        match staged.persist_noclobber(&path) {
            Ok(_) => {
                log::info!(
                    "Wrote {kind:?} vocabulary with {} codes to {}",
                    vocabulary.len(),
                    path.display()
                );
                Ok(StoredVocabulary {
                    vocabulary,
                    created: true,
                })
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                Self::load_existing(&path, kind)
            }
            Err(e) => Err(PrepError::io_at(&path, e.error)),
        }
    }
}

/// In-memory vocabulary store
#[derive(Debug, Default)]
pub struct MemoryVocabularyStore {
    entries: Mutex<FxHashMap<VocabularyKind, Vocabulary>>,
}

impl MemoryVocabularyStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored vocabulary for `kind`, if any
    #[must_use]
    pub fn get(&self, kind: VocabularyKind) -> Option<Vocabulary> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
    }
}

impl VocabularyStore for MemoryVocabularyStore {
    fn get_or_create<F>(&self, kind: VocabularyKind, build: F) -> Result<StoredVocabulary>
    where
        F: FnOnce() -> Vocabulary,
    {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = entries.get(&kind) {
            return Ok(StoredVocabulary {
                vocabulary: existing.clone(),
                created: false,
            });
        }
        let vocabulary = build();
        entries.insert(kind, vocabulary.clone());
        Ok(StoredVocabulary {
            vocabulary,
            created: true,
        })
    }
}
