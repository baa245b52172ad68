use crate::error::{Error, Result};
use crate::search::SemanticSearch;

/// Retrieval front end. `ask` hands back the best matching document as-is;
/// there is no generation step.
#[derive(Debug, Clone)]
pub struct Rag {
    search: Option<SemanticSearch>,
}

impl Rag {
    /// Build the backing index. A document set that cannot be indexed leaves
    /// the front end unbacked and every `ask` fails with `NoDocuments`.
    pub fn new(documents: Vec<String>) -> Self {
        match SemanticSearch::new(documents) {
            Ok(search) => Self { search: Some(search) },
            Err(err) => {
                tracing::warn!(error = %err, "retrieval index unavailable");
                Self { search: None }
            }
        }
    }

    pub fn from_search(search: SemanticSearch) -> Self {
        Self { search: Some(search) }
    }

    pub fn ask(&self, question: &str) -> Result<String> {
        let search = self.search.as_ref().ok_or(Error::NoDocuments)?;
        let (best_idx, score) = search.query(question, 1).into_iter().next().ok_or(Error::NoDocuments)?;
        tracing::debug!(best_idx, score, "answered from best matching document");
        search.document(best_idx).map(str::to_owned).ok_or(Error::NoDocuments)
    }

    pub fn search(&self) -> Option<&SemanticSearch> { self.search.as_ref() }

    pub fn is_ready(&self) -> bool { self.search.is_some() }
}
