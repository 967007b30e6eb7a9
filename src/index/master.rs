//! Master index: per-term document frequency and final block location

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const MASTER_INDEX_FILE: &str = "MasterIndex.tsv";

/// File name of the master index inside an index directory.
pub fn master_index_path(dir: &Path) -> PathBuf {
    dir.join(MASTER_INDEX_FILE)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MasterEntry {
    /// Distinct documents referencing the term across the whole corpus.
    pub doc_frequency: u64,
    /// Final block that physically contains the term's postings.
    pub block: u32,
}

/// Accumulates per-term totals across merge rounds and persists them sorted.
#[derive(Debug, Default)]
pub struct MasterIndex {
    entries: BTreeMap<String, MasterEntry>,
}

impl MasterIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to a term's document frequency and record its last-known final
    /// block number.
    pub fn record(&mut self, term: &str, doc_freq_delta: u64, block: u32) {
        if let Some(entry) = self.entries.get_mut(term) {
            entry.doc_frequency += doc_freq_delta;
            entry.block = block;
        } else {
            self.entries.insert(
                term.to_string(),
                MasterEntry {
                    doc_frequency: doc_freq_delta,
                    block,
                },
            );
        }
    }

    /// Number of distinct terms in the final vocabulary.
    pub fn vocabulary_size(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, term: &str) -> Option<&MasterEntry> {
        self.entries.get(term)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MasterEntry)> {
        self.entries.iter()
    }

    /// Write all entries ascending by term.
    pub fn persist(&self, dir: &Path) -> Result<()> {
        let file = File::create(master_index_path(dir))?;
        let mut writer = BufWriter::new(file);
        for (term, entry) in &self.entries {
            writeln!(writer, "{}\t{}\t{}", term, entry.doc_frequency, entry.block)?;
        }
        writer.flush()?;
        Ok(())
    }
}
