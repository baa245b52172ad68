use crate::error::Result;
use crate::vectorizer::{SparseVector, TfidfConfig, TfidfVectorizer};
use crate::{DocId, Posting, TermId};
use std::cmp::Ordering;
use std::collections::HashMap;

pub const DEFAULT_TOP_K: usize = 5;

/// In-memory TF-IDF index over a fixed, ordered document set.
///
/// The document matrix is kept column-wise as postings lists so a query only
/// touches the documents that share a term with it. The index never changes
/// after construction, so it can be shared between threads for reads.
#[derive(Debug, Clone)]
pub struct SemanticSearch {
    documents: Vec<String>,
    vectorizer: TfidfVectorizer,
    postings: HashMap<TermId, Vec<Posting>>, // postings sorted by doc_id
    doc_norms: Vec<f32>,
}

impl SemanticSearch {
    pub fn new(documents: Vec<String>) -> Result<Self> {
        Self::with_config(documents, TfidfConfig::default())
    }

    pub fn with_config(documents: Vec<String>, config: TfidfConfig) -> Result<Self> {
        let (vectorizer, rows) = TfidfVectorizer::fit(&documents[..], config)?;

        let mut postings: HashMap<TermId, Vec<Posting>> = HashMap::new();
        let mut doc_norms = Vec::with_capacity(rows.len());
        for (doc_id, row) in rows.iter().enumerate() {
            doc_norms.push(row.norm());
            for &(tid, weight) in row.entries() {
                postings.entry(tid).or_default().push(Posting { doc_id: doc_id as DocId, weight });
            }
        }

        tracing::info!(num_docs = documents.len(), num_terms = vectorizer.vocabulary_len(), "built semantic search index");
        Ok(Self { documents, vectorizer, postings, doc_norms })
    }

    /// Rank every document by cosine similarity to `text` and return the
    /// best `top_k` as (document index, score). Equal scores keep document
    /// order.
    pub fn query(&self, text: &str, top_k: usize) -> Vec<(usize, f32)> {
        let q = self.vectorizer.transform(text);
        let scores = self.scores(&q);

        let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
        // sort_by is stable, which is what keeps ties in document order
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked.truncate(top_k.min(self.documents.len()));
        ranked
    }

    pub fn query_default(&self, text: &str) -> Vec<(usize, f32)> {
        self.query(text, DEFAULT_TOP_K)
    }

    fn scores(&self, q: &SparseVector) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.documents.len()];
        let q_norm = q.norm();
        if q_norm == 0.0 {
            return scores;
        }
        for &(tid, q_w) in q.entries() {
            if let Some(plist) = self.postings.get(&tid) {
                for p in plist {
                    scores[p.doc_id as usize] += p.weight * q_w;
                }
            }
        }
        for (score, &d_norm) in scores.iter_mut().zip(&self.doc_norms) {
            *score = if d_norm == 0.0 { 0.0 } else { *score / (q_norm * d_norm) };
        }
        scores
    }

    pub fn len(&self) -> usize { self.documents.len() }

    /// Always false: construction rejects an empty document set.
    pub fn is_empty(&self) -> bool { self.documents.is_empty() }

    pub fn document(&self, index: usize) -> Option<&str> {
        self.documents.get(index).map(String::as_str)
    }

    pub fn documents(&self) -> &[String] { &self.documents }

    pub fn vectorizer(&self) -> &TfidfVectorizer { &self.vectorizer }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn index(docs: &[&str]) -> SemanticSearch {
        SemanticSearch::new(docs.iter().map(|d| d.to_string()).collect()).unwrap()
    }

    #[test]
    fn ranks_best_match_first() {
        let s = index(&["The sky is blue.", "Cats are mammals."]);
        let res = s.query("color of sky", 5);
        assert_eq!(res.len(), 2);
        assert_eq!(res[0].0, 0);
        assert!(res[0].1 > 0.0);
        assert_eq!(res[1], (1, 0.0));
    }

    #[test]
    fn top_k_is_clamped_to_document_count() {
        let s = index(&["alpha", "beta", "gamma"]);
        assert_eq!(s.query("alpha", 10).len(), 3);
        assert_eq!(s.query_default("alpha").len(), 3);
        assert_eq!(s.query("alpha", 2).len(), 2);
        assert!(s.query("alpha", 0).is_empty());
    }

    #[test]
    fn ties_keep_document_order() {
        let s = index(&["unrelated words", "rust search", "more filler", "rust search"]);
        let res = s.query("rust search", 4);
        assert_eq!(res[0].0, 1);
        assert_eq!(res[1].0, 3);
        assert_eq!(res[0].1, res[1].1);
        // zero scores also come back in order
        assert_eq!(res[2].0, 0);
        assert_eq!(res[3].0, 2);
    }

    #[test]
    fn exact_text_ranks_itself_first() {
        let docs = ["rust borrow checker", "python garbage collector", "go goroutines scheduler"];
        let s = index(&docs);
        for (i, d) in docs.iter().enumerate() {
            let res = s.query(d, 1);
            assert_eq!(res[0].0, i);
            assert!((res[0].1 - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn scores_are_descending_and_bounded() {
        let s = index(&["a quick brown fox", "the lazy dog", "quick quick dog", "brown bear"]);
        let res = s.query("quick brown dog", 4);
        for pair in res.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
        for (idx, score) in res {
            assert!(idx < s.len());
            assert!((0.0..=1.0 + 1e-5).contains(&score));
        }
    }

    #[test]
    fn out_of_vocabulary_query_scores_zero() {
        let s = index(&["alpha", "beta"]);
        assert_eq!(s.query("zeta", 2), vec![(0, 0.0), (1, 0.0)]);
        assert_eq!(s.query("", 2), vec![(0, 0.0), (1, 0.0)]);
    }

    #[test]
    fn empty_set_is_invalid_input() {
        assert!(matches!(SemanticSearch::new(vec![]), Err(Error::InvalidInput(_))));
        assert!(matches!(SemanticSearch::new(vec![String::new(), "x".into()]), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn english_analyzer_matches_inflections() {
        let config = TfidfConfig { analyzer: crate::Analyzer::english(), ..TfidfConfig::default() };
        let s = SemanticSearch::with_config(vec!["runners running".into(), "cats sleeping".into()], config).unwrap();
        assert_eq!(s.query("run", 1)[0].0, 0);
    }
}
