//! Corpus reader: gzip-compressed TSV source files
//!
//! The source format has no quoting or escaping, so rows split cleanly on
//! tabs. The header row is skipped on open; the configured column offsets
//! select the natural key and the text fields concatenated as the body.

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::config::SourceConfig;
use crate::error::{Result, SpimiError};

/// One raw document from the source, before tokenization.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceDocument {
    pub natural_key: String,
    pub body: String,
}

pub struct CorpusReader {
    reader: BufReader<GzDecoder<File>>,
    config: SourceConfig,
    path: String,
    line: u64,
}

impl CorpusReader {
    /// Open a gzip-compressed TSV corpus and skip its header row.
    pub fn open(path: &Path, config: SourceConfig) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(GzDecoder::new(file));

        let mut header = String::new();
        reader.read_line(&mut header)?;

        Ok(Self {
            reader,
            config,
            path: path.display().to_string(),
            line: 1,
        })
    }

    /// Read the next document, or `None` when the corpus is exhausted.
    /// A row missing an expected column aborts the run.
    pub fn next_document(&mut self) -> Result<Option<SourceDocument>> {
        let mut buf = String::new();
        let read = self.reader.read_line(&mut buf)?;
        if read == 0 {
            return Ok(None);
        }
        self.line += 1;

        let row = buf.trim_end_matches(['\n', '\r']);
        let fields: Vec<&str> = row.split('\t').collect();

        let max_column = self.config.max_column();
        if fields.len() <= max_column {
            return Err(SpimiError::SourceFormat {
                path: self.path.clone(),
                line: self.line,
                reason: format!(
                    "expected at least {} columns, found {}",
                    max_column + 1,
                    fields.len()
                ),
            });
        }

        let natural_key = fields[self.config.key_column].to_string();
        let body = self
            .config
            .body_columns
            .iter()
            .map(|&c| fields[c])
            .collect::<Vec<&str>>()
            .join(" ");

        Ok(Some(SourceDocument { natural_key, body }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_corpus(dir: &Path, name: &str, rows: &[&str]) -> std::path::PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        writeln!(encoder, "id\tbody").unwrap();
        for row in rows {
            writeln!(encoder, "{}", row).unwrap();
        }
        encoder.finish().unwrap();
        path
    }

    fn test_config() -> SourceConfig {
        SourceConfig {
            key_column: 0,
            body_columns: vec![1],
        }
    }

    #[test]
    fn test_reads_documents_in_order() {
        let tmp = TempDir::new().unwrap();
        let path = write_corpus(
            tmp.path(),
            "corpus.tsv.gz",
            &["doc0\tthe cat sat", "doc1\tthe dog sat"],
        );

        let mut reader = CorpusReader::open(&path, test_config()).unwrap();
        assert_eq!(
            reader.next_document().unwrap(),
            Some(SourceDocument {
                natural_key: "doc0".to_string(),
                body: "the cat sat".to_string(),
            })
        );
        assert_eq!(
            reader.next_document().unwrap().unwrap().natural_key,
            "doc1"
        );
        assert_eq!(reader.next_document().unwrap(), None);
    }

    #[test]
    fn test_header_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let path = write_corpus(tmp.path(), "corpus.tsv.gz", &["doc0\tonly row"]);

        let mut reader = CorpusReader::open(&path, test_config()).unwrap();
        let doc = reader.next_document().unwrap().unwrap();
        assert_eq!(doc.natural_key, "doc0");
        assert!(reader.next_document().unwrap().is_none());
    }

    #[test]
    fn test_body_columns_concatenated() {
        let tmp = TempDir::new().unwrap();
        let path = write_corpus(tmp.path(), "corpus.tsv.gz", &["x\tk1\ttitle\theadline\tbody"]);

        let config = SourceConfig {
            key_column: 1,
            body_columns: vec![2, 3, 4],
        };
        let mut reader = CorpusReader::open(&path, config).unwrap();
        let doc = reader.next_document().unwrap().unwrap();
        assert_eq!(doc.natural_key, "k1");
        assert_eq!(doc.body, "title headline body");
    }

    #[test]
    fn test_short_row_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = write_corpus(tmp.path(), "corpus.tsv.gz", &["doc0\tfine", "short-row"]);

        let mut reader = CorpusReader::open(&path, test_config()).unwrap();
        assert!(reader.next_document().unwrap().is_some());

        match reader.next_document() {
            Err(SpimiError::SourceFormat { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected SourceFormat error, got {:?}", other.map(|_| ())),
        }
    }
}
