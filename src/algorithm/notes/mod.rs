//! Note selection, cleaning and chunking

pub mod chunker;
pub mod text;
pub mod window;

pub use chunker::NoteChunker;
pub use text::NoteCleaner;
pub use window::{AdmissionDocument, NoteWindow};
