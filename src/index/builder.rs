//! Block builder: bounded-memory accumulation of postings
//!
//! Postings for the current batch of documents accumulate in one in-memory
//! map. The caller checks `should_flush` before each new document; a flush
//! serializes the whole structure as the next temporary block and clears it.

use std::path::PathBuf;
use tracing::debug;

use super::block::{temp_block_path, write_block};
use super::postings::{DocId, PostingsMap};
use crate::error::Result;
use crate::tokenizer::DocumentTerms;

pub struct BlockBuilder {
    dir: PathBuf,
    map: PostingsMap,
    max_postings_per_block: u64,
    temp_blocks: u32,
}

impl BlockBuilder {
    pub fn new(dir: PathBuf, positional: bool, max_postings_per_block: u64) -> Self {
        Self {
            dir,
            map: PostingsMap::new(positional),
            max_postings_per_block,
            temp_blocks: 0,
        }
    }

    /// Whether the accumulated posting count has exceeded the block
    /// threshold. Checked before each new document is indexed.
    pub fn should_flush(&self) -> bool {
        self.map.posting_count() > self.max_postings_per_block
    }

    /// Insert one document's terms. Returns the number of postings added.
    pub fn index_document(&mut self, doc_id: DocId, terms: &DocumentTerms) -> u64 {
        self.map.add_document(doc_id, terms)
    }

    /// Serialize the current structure as the next temporary block and reset.
    pub fn flush_temp_block(&mut self) -> Result<()> {
        self.temp_blocks += 1;
        let path = temp_block_path(&self.dir, self.temp_blocks);
        debug!(
            block = self.temp_blocks,
            terms = self.map.term_count(),
            postings = self.map.posting_count(),
            "flushing temporary block"
        );
        write_block(&path, &self.map)?;
        self.map.clear();
        Ok(())
    }

    /// Flush any remaining postings unconditionally once the source is
    /// exhausted. Returns the total number of temporary blocks produced.
    pub fn finish(mut self) -> Result<u32> {
        if !self.map.is_empty() {
            self.flush_temp_block()?;
        }
        Ok(self.temp_blocks)
    }

    pub fn temp_block_count(&self) -> u32 {
        self.temp_blocks
    }
}
