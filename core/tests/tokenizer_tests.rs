use docsift_core::tokenizer::{tokenize, Analyzer};

#[test]
fn it_normalizes_and_stems() {
    let toks = tokenize("Running Runners RUN! The ﬁnal menu.");
    let words: Vec<String> = toks.into_iter().map(|(w, _)| w).collect();
    // Stemming to "run" should appear
    assert!(words.contains(&"run".to_string()));
    // NFKC folds the "ﬁ" ligature
    assert!(words.contains(&"final".to_string()));
}

#[test]
fn it_filters_stopwords() {
    let toks = tokenize("The quick brown fox and the lazy dog");
    let words: Vec<String> = toks.into_iter().map(|(w, _)| w).collect();
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
}

#[test]
fn default_analyzer_splits_on_punctuation() {
    let words = Analyzer::default().terms("U.S. Code, Title-42: health & welfare");
    assert_eq!(words, vec!["code", "title", "42", "health", "welfare"]);
}
