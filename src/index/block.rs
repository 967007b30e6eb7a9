//! On-disk block files: term-sorted TSV, one row per term
//!
//! The same row format serves temporary and final blocks: the term, then one
//! tab-separated field per posting. Writers take a whole postings map; readers
//! are cursors with an explicit end-of-block signal so the merge never reuses
//! a stale row.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::postings::{PostingsMap, TermPostings};
use crate::error::{Result, SpimiError};

/// File name of the n-th temporary block (1-based).
pub fn temp_block_path(dir: &Path, n: u32) -> PathBuf {
    dir.join(format!("TempBlock{}.tsv", n))
}

/// File name of the k-th final block (1-based).
pub fn final_block_path(dir: &Path, k: u32) -> PathBuf {
    dir.join(format!("PostingIndexBlock{}.tsv", k))
}

/// Write a postings map as one block file, rows ascending by term.
///
/// The writer is scoped to this call: the handle is flushed and closed before
/// returning on every path, so a failed block never holds an open file.
pub fn write_block(path: &Path, map: &PostingsMap) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let mut row = String::new();
    for (term, postings) in map.iter() {
        row.clear();
        row.push_str(term);
        postings.encode_fields(&mut row);
        row.push('\n');
        writer.write_all(row.as_bytes())?;
    }

    writer.flush()?;
    Ok(())
}

/// Read cursor over one block file, yielding rows in term order.
pub struct BlockCursor {
    reader: BufReader<File>,
    path: String,
    line: u64,
    positional: bool,
    exhausted: bool,
}

impl BlockCursor {
    pub fn open(path: &Path, positional: bool) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            path: path.display().to_string(),
            line: 0,
            positional,
            exhausted: false,
        })
    }

    /// Whether the cursor has read past the last row.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Read the next (term, postings) row, or `None` once the block ends.
    pub fn next_row(&mut self) -> Result<Option<(String, TermPostings)>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut buf = String::new();
        let read = self.reader.read_line(&mut buf)?;
        if read == 0 {
            self.exhausted = true;
            return Ok(None);
        }
        self.line += 1;

        let row = buf.trim_end_matches('\n');
        let mut fields = row.split('\t');
        let term = match fields.next() {
            Some(term) if !term.is_empty() => term.to_string(),
            _ => {
                return Err(SpimiError::IndexFormat {
                    path: self.path.clone(),
                    line: self.line,
                    reason: "row has no term".to_string(),
                })
            }
        };

        let fields: Vec<&str> = fields.collect();
        let postings = TermPostings::parse_fields(&fields, self.positional).map_err(|reason| {
            SpimiError::IndexFormat {
                path: self.path.clone(),
                line: self.line,
                reason,
            }
        })?;

        Ok(Some((term, postings)))
    }
}
