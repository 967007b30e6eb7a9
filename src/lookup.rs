//! Read-only term lookup over a persisted index
//!
//! Loads the master index and doc key files; query terms pass through the
//! same normalization used at index time. No postings are retrieved and no
//! scoring happens here.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Result, SpimiError};
use crate::index::{doc_keys_path, master_index_path, DocId};
use crate::tokenizer::Tokenizer;

/// Per-term statistics recorded in the master index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TermStats {
    pub doc_frequency: u64,
    /// Final block number holding the term's postings.
    pub block: u32,
}

/// The outcome of looking up one normalized token.
#[derive(Clone, Debug, PartialEq)]
pub struct TermLookupResult {
    pub normalized: String,
    pub stats: Option<TermStats>,
}

pub struct TermLookup {
    master: HashMap<String, TermStats>,
    doc_keys: HashMap<DocId, String>,
    tokenizer: Tokenizer,
}

impl TermLookup {
    /// Load the master index and doc keys from an index directory. The
    /// tokenizer must be configured identically to the indexing run.
    pub fn open(index_dir: &Path, tokenizer: Tokenizer) -> Result<Self> {
        let master = read_master_index(&master_index_path(index_dir))?;
        let doc_keys = read_doc_keys(&doc_keys_path(index_dir))?;
        Ok(Self {
            master,
            doc_keys,
            tokenizer,
        })
    }

    /// Normalize a raw query and report statistics for each resulting token.
    pub fn lookup(&self, raw: &str) -> Vec<TermLookupResult> {
        self.tokenizer
            .normalize_query(raw)
            .into_iter()
            .map(|token| {
                let stats = self.master.get(&token).copied();
                TermLookupResult {
                    normalized: token,
                    stats,
                }
            })
            .collect()
    }

    /// Resolve a surrogate document id to its natural source key.
    pub fn doc_key(&self, id: DocId) -> Option<&str> {
        self.doc_keys.get(&id).map(|s| s.as_str())
    }

    pub fn vocabulary_size(&self) -> usize {
        self.master.len()
    }

    pub fn document_count(&self) -> usize {
        self.doc_keys.len()
    }
}

fn read_master_index(path: &Path) -> Result<HashMap<String, TermStats>> {
    let file = File::open(path)?;
    let mut master = HashMap::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let malformed = |reason: &str| SpimiError::IndexFormat {
            path: path.display().to_string(),
            line: (i + 1) as u64,
            reason: reason.to_string(),
        };

        let mut fields = line.split('\t');
        let term = fields.next().ok_or_else(|| malformed("missing term"))?;
        let doc_frequency = fields
            .next()
            .and_then(|f| f.parse::<u64>().ok())
            .ok_or_else(|| malformed("missing or invalid document frequency"))?;
        let block = fields
            .next()
            .and_then(|f| f.parse::<u32>().ok())
            .ok_or_else(|| malformed("missing or invalid block number"))?;

        master.insert(
            term.to_string(),
            TermStats {
                doc_frequency,
                block,
            },
        );
    }
    Ok(master)
}

fn read_doc_keys(path: &Path) -> Result<HashMap<DocId, String>> {
    let file = File::open(path)?;
    let mut doc_keys = HashMap::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let malformed = || SpimiError::IndexFormat {
            path: path.display().to_string(),
            line: (i + 1) as u64,
            reason: "expected 'surrogateId\\tnaturalKey'".to_string(),
        };

        let (id, key) = line.split_once('\t').ok_or_else(malformed)?;
        let id: DocId = id.parse().map_err(|_| malformed())?;
        doc_keys.insert(id, key.to_string());
    }
    Ok(doc_keys)
}
