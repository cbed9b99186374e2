//! Code vocabularies and their persistent store

pub mod store;
pub mod vocabulary;

pub use store::{
    FileVocabularyStore, MemoryVocabularyStore, StoredVocabulary, VocabularyKind,
    VocabularyStore,
};
pub use vocabulary::{PADDING_CODE, PADDING_INDEX, Vocabulary};
