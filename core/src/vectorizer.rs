use crate::error::{Error, Result};
use crate::tokenizer::Analyzer;
use crate::TermId;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Copy)]
pub struct TfidfConfig {
    pub analyzer: Analyzer,
    /// idf = ln((1 + n) / (1 + df)) + 1 instead of ln(n / df) + 1
    pub smooth_idf: bool,
    /// tf = 1 + ln(count) instead of the raw count
    pub sublinear_tf: bool,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self { analyzer: Analyzer::default(), smooth_idf: true, sublinear_tf: false }
    }
}

/// Sparse weight vector; entries are sorted by term id and never hold zeros.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(TermId, f32)>,
}

impl SparseVector {
    pub fn entries(&self) -> &[(TermId, f32)] { &self.entries }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
    }

    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f32;
        while i < self.entries.len() && j < other.entries.len() {
            let (a, wa) = self.entries[i];
            let (b, wb) = other.entries[j];
            if a == b {
                sum += wa * wb;
                i += 1;
                j += 1;
            } else if a < b {
                i += 1;
            } else {
                j += 1;
            }
        }
        sum
    }

    /// Cosine similarity, 0 when either vector has zero norm.
    pub fn cosine(&self, other: &SparseVector) -> f32 {
        let denom = self.norm() * other.norm();
        if denom == 0.0 { 0.0 } else { self.dot(other) / denom }
    }

    fn l2_normalized(mut self) -> Self {
        let norm = self.norm();
        if norm > 0.0 {
            for (_, w) in self.entries.iter_mut() { *w /= norm; }
        }
        self
    }
}

/// Vocabulary and IDF weights learned from a fixed document set.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    config: TfidfConfig,
    dictionary: HashMap<String, TermId>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    /// Learn the vocabulary from `docs` and return the fitted vectorizer along
    /// with one normalized row per document.
    pub fn fit<S: AsRef<str>>(docs: &[S], config: TfidfConfig) -> Result<(Self, Vec<SparseVector>)> {
        if docs.is_empty() {
            return Err(Error::InvalidInput("document set is empty".into()));
        }

        let counts: Vec<HashMap<String, u32>> = docs
            .iter()
            .map(|d| term_counts(&config.analyzer, d.as_ref()))
            .collect();

        // Term ids follow sorted term order so fitting is deterministic.
        let vocab: BTreeSet<&str> = counts.iter().flat_map(|c| c.keys().map(String::as_str)).collect();
        if vocab.is_empty() {
            return Err(Error::InvalidInput("empty vocabulary; documents contain no indexable terms".into()));
        }
        let dictionary: HashMap<String, TermId> = vocab
            .iter()
            .enumerate()
            .map(|(id, term)| (term.to_string(), id as TermId))
            .collect();

        let mut df = vec![0u32; dictionary.len()];
        for c in &counts {
            for term in c.keys() {
                df[dictionary[term] as usize] += 1;
            }
        }
        let n = docs.len() as f32;
        let idf = df
            .iter()
            .map(|&df_t| {
                let df_t = df_t as f32;
                if config.smooth_idf { ((1.0 + n) / (1.0 + df_t)).ln() + 1.0 } else { (n / df_t).ln() + 1.0 }
            })
            .collect();

        let vectorizer = Self { config, dictionary, idf };
        let rows = counts.iter().map(|c| vectorizer.weigh(c)).collect();
        tracing::debug!(num_docs = docs.len(), num_terms = vectorizer.dictionary.len(), "fitted tf-idf vocabulary");
        Ok((vectorizer, rows))
    }

    /// Project text into the fitted vocabulary. Unknown terms are dropped.
    pub fn transform(&self, text: &str) -> SparseVector {
        self.weigh(&term_counts(&self.config.analyzer, text))
    }

    pub fn vocabulary_len(&self) -> usize { self.dictionary.len() }

    pub fn term_id(&self, term: &str) -> Option<TermId> { self.dictionary.get(term).copied() }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.term_id(term).map(|id| self.idf[id as usize])
    }

    pub fn config(&self) -> &TfidfConfig { &self.config }

    fn weigh(&self, counts: &HashMap<String, u32>) -> SparseVector {
        let mut weights: BTreeMap<TermId, f32> = BTreeMap::new();
        for (term, &count) in counts {
            let Some(&tid) = self.dictionary.get(term) else { continue };
            let tf = if self.config.sublinear_tf { 1.0 + (count as f32).ln() } else { count as f32 };
            weights.insert(tid, tf * self.idf[tid as usize]);
        }
        SparseVector { entries: weights.into_iter().collect() }.l2_normalized()
    }
}

fn term_counts(analyzer: &Analyzer, text: &str) -> HashMap<String, u32> {
    let mut tf: HashMap<String, u32> = HashMap::new();
    for (term, _pos) in analyzer.tokenize(text) {
        *tf.entry(term).or_insert(0) += 1;
    }
    tf
}
