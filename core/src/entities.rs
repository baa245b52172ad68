//! Rule-based named entity extraction.
//!
//! An [`EntityModel`] is built once (from the builtin rules or a JSON pattern
//! file) and then passed to whoever needs to extract entities.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMention {
    pub text: String,
    pub label: String,
    /// Byte offsets into the input text.
    pub start: usize,
    pub end: usize,
}

/// A single rule: exactly one of `regex` or `phrase` must be set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternSpec {
    pub label: String,
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub phrase: Option<String>,
}

impl PatternSpec {
    pub fn regex(label: impl Into<String>, regex: impl Into<String>) -> Self {
        Self { label: label.into(), regex: Some(regex.into()), phrase: None }
    }

    pub fn phrase(label: impl Into<String>, phrase: impl Into<String>) -> Self {
        Self { label: label.into(), regex: None, phrase: Some(phrase.into()) }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternSet {
    pub patterns: Vec<PatternSpec>,
}

#[derive(Debug, Clone)]
struct Rule {
    label: String,
    re: Regex,
}

#[derive(Debug, Clone)]
pub struct EntityModel {
    rules: Vec<Rule>,
}

const MONTHS: &str = "January|February|March|April|May|June|July|August|September|October|November|December";

impl EntityModel {
    pub fn builtin() -> Self {
        let specs = [
            ("LAW", r"\bPub(?:lic)?\.? ?L(?:aw)?\.? ?\d{1,3}-\d{1,4}\b".to_string()),
            ("LAW", r"\b\d{1,2} U\.S\.C\. §* ?\d+[a-z]?\b".to_string()),
            ("LAW", r"\b(?:H\.R\.|S\.|H\.J\.Res\.|S\.J\.Res\.) ?\d{1,5}\b".to_string()),
            ("DATE", format!(r"\b(?:{MONTHS}) \d{{1,2}}, \d{{4}}\b")),
            ("DATE", format!(r"\b(?:{MONTHS}) \d{{4}}\b")),
            ("DATE", r"\b\d{4}-\d{2}-\d{2}\b".to_string()),
            ("MONEY", r"\$\d[\d,]*(?:\.\d+)?(?: (?:thousand|million|billion|trillion))?".to_string()),
            ("PERCENT", r"\b\d+(?:\.\d+)?(?:%| percent\b)".to_string()),
        ];
        let rules = specs
            .into_iter()
            .map(|(label, src)| Rule { label: label.to_string(), re: Regex::new(&src).expect("builtin entity pattern") })
            .collect();
        Self { rules }
    }

    pub fn from_patterns(set: PatternSet) -> Result<Self> {
        let mut rules = Vec::with_capacity(set.patterns.len());
        for spec in set.patterns {
            let label = spec.label;
            let src = match (spec.regex, spec.phrase) {
                (Some(regex), None) => regex,
                (None, Some(phrase)) => format!(r"\b{}\b", regex::escape(&phrase)),
                _ => return Err(Error::InvalidInput(format!("pattern for {label} needs exactly one of regex or phrase"))),
            };
            let re = Regex::new(&src).map_err(|e| Error::InvalidInput(format!("pattern for {label}: {e}")))?;
            rules.push(Rule { label, re });
        }
        Ok(Self { rules })
    }

    /// Load a JSON pattern file: `{"patterns": [{"label": .., "regex": ..} | {"label": .., "phrase": ..}]}`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidInput(format!("{}: {e}", path.display())))?;
        let set: PatternSet = serde_json::from_str(&raw)
            .map_err(|e| Error::InvalidInput(format!("{}: {e}", path.display())))?;
        let model = Self::from_patterns(set)?;
        tracing::info!(path = %path.display(), rules = model.rules.len(), "loaded entity model");
        Ok(model)
    }

    /// Non-overlapping mentions in text order. On overlap the earliest start
    /// wins, then the longest span, then the rule declared first.
    pub fn extract(&self, text: &str) -> Vec<EntityMention> {
        let mut candidates: Vec<(usize, usize, usize)> = Vec::new(); // (start, end, rule)
        for (rule_idx, rule) in self.rules.iter().enumerate() {
            for m in rule.re.find_iter(text) {
                if m.start() < m.end() {
                    candidates.push((m.start(), m.end(), rule_idx));
                }
            }
        }
        candidates.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)).then(a.2.cmp(&b.2)));

        let mut out = Vec::new();
        let mut cursor = 0;
        for (start, end, rule_idx) in candidates {
            if start < cursor { continue; }
            out.push(EntityMention {
                text: text[start..end].to_string(),
                label: self.rules[rule_idx].label.clone(),
                start,
                end,
            });
            cursor = end;
        }
        out
    }
}

impl Default for EntityModel {
    fn default() -> Self { Self::builtin() }
}
