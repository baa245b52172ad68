pub mod entities;
pub mod error;
pub mod models;
pub mod rag;
pub mod search;
pub mod tokenizer;
pub mod vectorizer;

pub use error::{Error, Result};
pub use rag::Rag;
pub use search::{SemanticSearch, DEFAULT_TOP_K};
pub use tokenizer::Analyzer;
pub use vectorizer::{SparseVector, TfidfConfig, TfidfVectorizer};

pub type TermId = u32;
pub type DocId = u32;

/// One entry of a term's postings list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posting {
    pub doc_id: DocId,
    pub weight: f32, // normalized tf-idf weight
}
