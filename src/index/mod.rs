//! Block-based inverted index construction (SPIMI)
//!
//! Postings accumulate in memory up to a posting-count threshold, spill to
//! sorted temporary blocks, and a watermark-driven multi-way merge reassembles
//! them into term-sorted, non-overlapping final blocks plus a master index.
//!
//! # Architecture
//!
//! - `BlockBuilder`: bounded in-memory accumulation, temp block flushes
//! - `MergeEngine`: watermark multi-way merge into final blocks
//! - `MasterIndex`: term -> (document frequency, final block) directory
//! - `DocKeyRegistry`: surrogate id -> natural source key
//! - `Indexer`: run orchestration and statistics

mod block;
mod builder;
mod doc_keys;
mod indexer;
mod master;
mod merge;
mod postings;
mod source;

pub use block::{final_block_path, temp_block_path, write_block, BlockCursor};
pub use builder::BlockBuilder;
pub use doc_keys::{doc_keys_path, DocKeyRegistry, DOC_KEYS_FILE};
pub use indexer::{IndexStats, Indexer};
pub use master::{master_index_path, MasterEntry, MasterIndex, MASTER_INDEX_FILE};
pub use merge::MergeEngine;
pub use postings::{DocId, PostingsMap, TermPostings};
pub use source::{CorpusReader, SourceDocument};
