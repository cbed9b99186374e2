//! Fixed-size word chunking of admission documents

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::algorithm::notes::text::NoteCleaner;
use crate::algorithm::notes::window::AdmissionDocument;
use crate::error::Result;
use crate::models::{AdmissionRecord, NoteChunk};
use crate::utils::logging::{create_main_progress_bar, finish_progress_bar, log_stage_complete};

/// Default words per chunk
pub const DEFAULT_CHUNK_WORDS: usize = 318;

/// Default threshold a trailing chunk must exceed to be kept
pub const DEFAULT_MIN_REMAINDER_WORDS: usize = 10;

/// Cleans documents and splits them into fixed-size word chunks
#[derive(Debug, Clone)]
pub struct NoteChunker {
    cleaner: NoteCleaner,
    chunk_words: usize,
    min_remainder_words: usize,
}

impl NoteChunker {
    /// Create a chunker; `chunk_words` must be non-zero
    pub fn new(chunk_words: usize, min_remainder_words: usize) -> Result<Self> {
        Ok(Self {
            cleaner: NoteCleaner::new()?,
            chunk_words: chunk_words.max(1),
            min_remainder_words,
        })
    }

    /// Split already cleaned `text` into chunks of the admission `record`
    ///
    /// Every full run of `chunk_words` words becomes a chunk. The trailing
    /// words form one more chunk only if there are more than
    /// `min_remainder_words` of them.
    #[must_use]
    pub fn chunk(&self, record: &Arc<AdmissionRecord>, text: &str) -> Vec<NoteChunk> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let remainder = words.len() % self.chunk_words;

        let mut chunks: Vec<NoteChunk> = words
            .chunks_exact(self.chunk_words)
            .map(|window| NoteChunk {
                record: Arc::clone(record),
                text: window.join(" "),
            })
            .collect();
        if remainder > self.min_remainder_words {
            chunks.push(NoteChunk {
                record: Arc::clone(record),
                text: words[words.len() - remainder..].join(" "),
            });
        }
        chunks
    }

    /// Clean and chunk every document, keeping document order
    #[must_use]
    pub fn chunk_documents(&self, documents: &[AdmissionDocument]) -> Vec<NoteChunk> {
        let start = Instant::now();
        let pb = create_main_progress_bar(documents.len() as u64, Some("Chunking notes"));

        let per_document: Vec<Vec<NoteChunk>> = documents
            .par_iter()
            .map(|document| {
                let cleaned = self.cleaner.clean(Some(&document.text));
                let chunks = self.chunk(&document.record, &cleaned);
                pb.inc(1);
                chunks
            })
            .collect();
        finish_progress_bar(&pb, None);

        let chunks: Vec<NoteChunk> = per_document.into_iter().flatten().collect();
        log_stage_complete("Note chunking", chunks.len(), start.elapsed());
        chunks
    }
}
