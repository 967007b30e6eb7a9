//! Doc key registry: surrogate id to natural source key

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::postings::DocId;
use crate::error::Result;

pub const DOC_KEYS_FILE: &str = "DocKeys.tsv";

/// File name of the doc key registry inside an index directory.
pub fn doc_keys_path(dir: &Path) -> PathBuf {
    dir.join(DOC_KEYS_FILE)
}

/// Owns the surrogate id counter for a run. Ids are dense and assigned in the
/// order documents are read from the source, starting at 1.
#[derive(Debug, Default)]
pub struct DocKeyRegistry {
    keys: Vec<String>,
}

impl DocKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the next sequential surrogate id to a natural key.
    pub fn register(&mut self, natural_key: &str) -> DocId {
        self.keys.push(natural_key.to_string());
        self.keys.len() as DocId
    }

    /// Number of documents registered so far.
    pub fn len(&self) -> u64 {
        self.keys.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Write entries in assignment order, surrogate id ascending.
    pub fn persist(&self, dir: &Path) -> Result<()> {
        let file = File::create(doc_keys_path(dir))?;
        let mut writer = BufWriter::new(file);
        for (i, key) in self.keys.iter().enumerate() {
            writeln!(writer, "{}\t{}", i + 1, key)?;
        }
        writer.flush()?;
        Ok(())
    }
}
