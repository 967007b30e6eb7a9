//! Indexing run orchestration and statistics
//!
//! Drives the full pipeline: source reading, block building, the multi-way
//! merge, and master index / doc key persistence, all single-threaded under
//! the configured memory bound.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

use super::block::final_block_path;
use super::builder::BlockBuilder;
use super::doc_keys::{doc_keys_path, DocKeyRegistry};
use super::master::{master_index_path, MasterIndex};
use super::merge::MergeEngine;
use super::source::CorpusReader;
use crate::config::{IndexerConfig, SourceConfig};
use crate::error::Result;
use crate::tokenizer::Tokenizer;

/// Statistics reported for one indexing run.
#[derive(Clone, Debug, Default)]
pub struct IndexStats {
    pub indexed_documents: u64,
    pub postings: u64,
    pub vocabulary_size: u64,
    pub temp_blocks: u32,
    pub final_blocks: u32,
    pub index_size_bytes: u64,
    pub elapsed: Duration,
}

pub struct Indexer {
    tokenizer: Tokenizer,
    config: IndexerConfig,
    source_config: SourceConfig,
}

impl Indexer {
    pub fn new(
        tokenizer: Tokenizer,
        config: IndexerConfig,
        source_config: SourceConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            tokenizer,
            config,
            source_config,
        })
    }

    /// Directory the index for a given corpus is written to: the output root
    /// joined with the source file name up to its first dot.
    pub fn output_dir(&self, source_path: &Path) -> PathBuf {
        let stem = source_path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.split('.').next().unwrap_or(name))
            .unwrap_or("corpus");
        self.config.output_root.join(stem)
    }

    /// Index a gzip-compressed TSV corpus. Overwrites any previous index for
    /// the same corpus in the output root.
    pub fn index_corpus(&self, source_path: &Path) -> Result<IndexStats> {
        let start = Instant::now();
        let dir = self.output_dir(source_path);
        fs::create_dir_all(&dir)?;

        info!(
            source = %source_path.display(),
            output = %dir.display(),
            positional = self.tokenizer.positional(),
            "starting indexing run"
        );

        let mut reader = CorpusReader::open(source_path, self.source_config.clone())?;
        let mut registry = DocKeyRegistry::new();
        let mut builder = BlockBuilder::new(
            dir.clone(),
            self.tokenizer.positional(),
            self.config.max_postings_per_block,
        );
        let mut postings = 0u64;

        while let Some(doc) = reader.next_document()? {
            if builder.should_flush() {
                builder.flush_temp_block()?;
            }
            let doc_id = registry.register(&doc.natural_key);
            let terms = self.tokenizer.tokenize(&doc.body);
            postings += builder.index_document(doc_id, &terms);
        }
        let temp_blocks = builder.finish()?;

        info!(
            documents = registry.len(),
            postings, temp_blocks, "accumulation finished, merging"
        );

        let mut master = MasterIndex::new();
        let engine = MergeEngine::new(
            dir.clone(),
            self.tokenizer.positional(),
            self.config.max_postings_per_block,
            self.config.round_headroom,
        );
        let final_blocks = engine.merge(temp_blocks, postings, &mut master)?;

        master.persist(&dir)?;
        registry.persist(&dir)?;

        let stats = IndexStats {
            indexed_documents: registry.len(),
            postings,
            vocabulary_size: master.vocabulary_size() as u64,
            temp_blocks,
            final_blocks,
            index_size_bytes: index_size_on_disk(&dir, final_blocks)?,
            elapsed: start.elapsed(),
        };

        info!(
            documents = stats.indexed_documents,
            postings = stats.postings,
            vocabulary = stats.vocabulary_size,
            final_blocks = stats.final_blocks,
            index_bytes = stats.index_size_bytes,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "indexing run complete"
        );

        Ok(stats)
    }
}

/// Total on-disk size of the persisted index: final blocks, master index and
/// doc keys. Temporary blocks are working files and not counted.
fn index_size_on_disk(dir: &Path, final_blocks: u32) -> Result<u64> {
    let mut size = 0;
    for k in 1..=final_blocks {
        size += fs::metadata(final_block_path(dir, k))?.len();
    }
    size += fs::metadata(master_index_path(dir))?.len();
    size += fs::metadata(doc_keys_path(dir))?.len();
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenizerConfig;

    fn indexer() -> Indexer {
        let tokenizer = Tokenizer::new(&TokenizerConfig {
            remove_stopwords: false,
            stem: false,
            min_word_size: 0,
            ..Default::default()
        })
        .unwrap();
        Indexer::new(tokenizer, IndexerConfig::default(), SourceConfig::default()).unwrap()
    }

    #[test]
    fn test_output_dir_uses_first_dot_stem() {
        let indexer = indexer();
        assert_eq!(
            indexer.output_dir(Path::new("/data/reviews_us.tsv.gz")),
            PathBuf::from("index/reviews_us")
        );
    }

    #[test]
    fn test_invalid_config_rejected_on_construction() {
        let tokenizer = Tokenizer::new(&TokenizerConfig::default()).unwrap();
        let config = IndexerConfig {
            max_postings_per_block: 0,
            ..Default::default()
        };
        assert!(Indexer::new(tokenizer, config, SourceConfig::default()).is_err());
    }
}
