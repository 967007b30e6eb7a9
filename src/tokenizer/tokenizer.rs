use rust_stemmers::{Algorithm, Stemmer};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use stop_words::{get, LANGUAGE};
use unicode_segmentation::UnicodeSegmentation;

use crate::config::TokenizerConfig;
use crate::error::Result;

/// Normalized terms produced for one document.
///
/// The shape is fixed for the lifetime of a run by the tokenizer's positional
/// flag, so downstream code never branches on the mode per document.
#[derive(Clone, Debug, PartialEq)]
pub enum DocumentTerms {
    /// Distinct terms, presence only.
    Docs(BTreeSet<String>),
    /// Term to the ascending, zero-based positions where it occurs.
    Positional(BTreeMap<String, Vec<u32>>),
}

impl DocumentTerms {
    /// Number of postings this document contributes: one per distinct term,
    /// in both modes.
    pub fn posting_count(&self) -> u64 {
        match self {
            DocumentTerms::Docs(terms) => terms.len() as u64,
            DocumentTerms::Positional(terms) => terms.len() as u64,
        }
    }
}

/// Text tokenizer with stemming and stopword removal
pub struct Tokenizer {
    config: TokenizerConfig,
    stemmer: Option<Stemmer>,
    stopwords: HashSet<String>,
}

impl Tokenizer {
    /// Create a new tokenizer from configuration.
    ///
    /// A custom stopword file (one word per line) takes precedence over the
    /// built-in English list; stopword removal can be disabled entirely.
    pub fn new(config: &TokenizerConfig) -> Result<Self> {
        let stemmer = if config.stem {
            Some(Stemmer::create(Algorithm::English))
        } else {
            None
        };

        let stopwords = if config.remove_stopwords {
            match &config.stopwords_path {
                Some(path) => fs::read_to_string(path)?
                    .lines()
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect(),
                None => get(LANGUAGE::English)
                    .into_iter()
                    .map(|s| s.to_lowercase())
                    .collect(),
            }
        } else {
            HashSet::new()
        };

        Ok(Self {
            config: config.clone(),
            stemmer,
            stopwords,
        })
    }

    /// Whether this tokenizer produces positional terms.
    pub fn positional(&self) -> bool {
        self.config.positional
    }

    /// Tokenize one document body according to the run's mode.
    pub fn tokenize(&self, text: &str) -> DocumentTerms {
        if self.config.positional {
            DocumentTerms::Positional(self.terms_with_positions(text))
        } else {
            DocumentTerms::Docs(self.unique_terms(text))
        }
    }

    /// Distinct normalized terms appearing in the text.
    pub fn unique_terms(&self, text: &str) -> BTreeSet<String> {
        let mut terms = BTreeSet::new();
        for word in self.words(text) {
            if let Some(term) = self.normalize(&word) {
                terms.insert(term);
            }
        }
        terms
    }

    /// Map from each normalized term to the ascending positions where it
    /// occurs. Positions index the lowercased alphabetic word sequence, so a
    /// word removed by the stopword or size filter still occupies a position.
    pub fn terms_with_positions(&self, text: &str) -> BTreeMap<String, Vec<u32>> {
        let mut terms: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        for (pos, word) in self.words(text).enumerate() {
            if let Some(term) = self.normalize(&word) {
                terms.entry(term).or_default().push(pos as u32);
            }
        }
        terms
    }

    /// Normalize a single query term the same way index-time text was
    /// normalized, for lookup. Multi-word input yields multiple tokens.
    pub fn normalize_query(&self, raw: &str) -> Vec<String> {
        self.words(raw)
            .filter_map(|word| self.normalize(&word))
            .collect()
    }

    /// Lowercased alphabetic words in order of appearance. Words containing
    /// digits or other non-letter characters are dropped before positions are
    /// assigned, matching the index's preprocessing contract.
    fn words<'a>(&self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        text.unicode_words()
            .filter(|word| word.chars().all(|c| c.is_alphabetic()))
            .map(|word| word.to_lowercase())
    }

    /// Apply the stopword filter, the size filter and the stemmer to one
    /// lowercased word, in a single pass.
    fn normalize(&self, word: &str) -> Option<String> {
        if self.stopwords.contains(word) {
            return None;
        }
        if word.len() <= self.config.min_word_size {
            return None;
        }
        match &self.stemmer {
            Some(stemmer) => Some(stemmer.stem(word).to_string()),
            None => Some(word.to_string()),
        }
    }
}
