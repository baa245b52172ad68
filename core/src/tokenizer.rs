use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;
use std::collections::HashSet;

lazy_static! {
    // Two or more word characters, the classic TF-IDF token pattern.
    static ref RE: Regex = Regex::new(r"(?u)\b\w\w+\b").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Text analysis pipeline shared by indexing and querying.
///
/// The default analyzer only normalizes (NFKC), lowercases and splits on the
/// token pattern. [`Analyzer::english`] also drops English stopwords and
/// applies Snowball stemming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Analyzer {
    pub remove_stopwords: bool,
    pub stem: bool,
}

impl Analyzer {
    pub fn english() -> Self {
        Self { remove_stopwords: true, stem: true }
    }

    /// Tokenize text into (term, position). Positions count every token
    /// matched by the pattern, including the ones filtered out afterwards.
    pub fn tokenize(&self, text: &str) -> Vec<(String, usize)> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        let mut tokens = Vec::new();
        for (pos, mat) in RE.find_iter(&normalized).enumerate() {
            let token = mat.as_str();
            if self.remove_stopwords && is_stopword(token) { continue; }
            let term = if self.stem { STEMMER.stem(token).into_owned() } else { token.to_string() };
            tokens.push((term, pos));
        }
        tokens
    }

    pub fn terms(&self, text: &str) -> Vec<String> {
        self.tokenize(text).into_iter().map(|(t, _)| t).collect()
    }
}

/// Tokenize with the English pipeline (stopwords + stemming).
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    Analyzer::english().tokenize(text)
}
