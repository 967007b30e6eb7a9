use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, SpimiError};

/// Tokenizer configuration
///
/// The positional flag is fixed for the lifetime of a run: it selects the
/// shape of every in-memory postings structure and the on-disk posting
/// encoding, for both indexing and lookup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenizerConfig {
    pub remove_stopwords: bool,
    /// Custom stopword list, one word per line. When absent and
    /// `remove_stopwords` is set, the built-in English list is used.
    pub stopwords_path: Option<PathBuf>,
    pub stem: bool,
    /// Words must be strictly longer than this to be kept. 0 disables the filter.
    pub min_word_size: usize,
    pub positional: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            remove_stopwords: true,
            stopwords_path: None,
            stem: true,
            min_word_size: 3,
            positional: false,
        }
    }
}

/// Indexer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Flush threshold for the block builder and block size for the merge.
    pub max_postings_per_block: u64,
    /// Fraction of the even per-block split each merge round may read.
    /// Reserves headroom so terms straddling the round boundary do not push
    /// the accumulator past the flush threshold before the merge step runs.
    pub round_headroom: f64,
    /// Root directory under which per-corpus index folders are created.
    pub output_root: PathBuf,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            max_postings_per_block: 1_000_000,
            round_headroom: 0.7,
            output_root: PathBuf::from("index"),
        }
    }
}

impl IndexerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_postings_per_block == 0 {
            return Err(SpimiError::Config(
                "max_postings_per_block must be > 0".to_string(),
            ));
        }
        if !(self.round_headroom > 0.0 && self.round_headroom <= 1.0) {
            return Err(SpimiError::Config(format!(
                "round_headroom must be in (0, 1], got {}",
                self.round_headroom
            )));
        }
        Ok(())
    }
}

/// Column layout of the source corpus.
///
/// The corpus is gzip-compressed TSV with no quoting or escaping and a header
/// row. Which columns hold the natural document key and the text fields is
/// agreed with the source provider; defaults match the Amazon review dumps
/// (review id, product title, review headline, review body).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceConfig {
    pub key_column: usize,
    /// Columns concatenated with spaces as the document body.
    pub body_columns: Vec<usize>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            key_column: 2,
            body_columns: vec![5, 12, 13],
        }
    }
}

impl SourceConfig {
    /// Highest column offset a source row must provide.
    pub fn max_column(&self) -> usize {
        self.body_columns
            .iter()
            .copied()
            .chain(std::iter::once(self.key_column))
            .max()
            .unwrap_or(0)
    }
}
