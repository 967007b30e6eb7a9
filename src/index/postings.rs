//! In-memory postings structures and the TSV row codec
//!
//! One sum-typed postings representation serves both run modes; the mode is
//! fixed when the map is created and never branches per operation site.

use std::collections::BTreeMap;

use crate::tokenizer::DocumentTerms;

/// Surrogate document identifier: dense, assigned in source order from 1.
pub type DocId = u32;

/// Postings list for one term.
///
/// Docs-only postings stay a flat vector: documents are indexed in surrogate
/// order and temp blocks are merged in block order, so ids arrive ascending
/// and appending preserves the order. Positional postings key on the doc id.
#[derive(Clone, Debug, PartialEq)]
pub enum TermPostings {
    Docs(Vec<DocId>),
    Positional(BTreeMap<DocId, Vec<u32>>),
}

impl TermPostings {
    pub fn empty(positional: bool) -> Self {
        if positional {
            TermPostings::Positional(BTreeMap::new())
        } else {
            TermPostings::Docs(Vec::new())
        }
    }

    /// Number of distinct documents in this list. This is the posting count
    /// in both modes; positions never count as extra postings.
    pub fn doc_count(&self) -> u64 {
        match self {
            TermPostings::Docs(ids) => ids.len() as u64,
            TermPostings::Positional(docs) => docs.len() as u64,
        }
    }

    /// Union another list into this one. Both lists come from the same run,
    /// so the variants always match and the doc id sets are disjoint.
    pub fn merge(&mut self, other: TermPostings) {
        match (self, other) {
            (TermPostings::Docs(ids), TermPostings::Docs(more)) => ids.extend(more),
            (TermPostings::Positional(docs), TermPostings::Positional(more)) => {
                docs.extend(more);
            }
            _ => debug_assert!(false, "postings mode mismatch within a run"),
        }
    }

    /// Encode the posting fields of one TSV row, without the term.
    pub fn encode_fields(&self, row: &mut String) {
        match self {
            TermPostings::Docs(ids) => {
                for id in ids {
                    row.push('\t');
                    row.push_str(&id.to_string());
                }
            }
            TermPostings::Positional(docs) => {
                for (id, positions) in docs {
                    row.push('\t');
                    row.push_str(&id.to_string());
                    row.push(':');
                    for (i, pos) in positions.iter().enumerate() {
                        if i > 0 {
                            row.push(',');
                        }
                        row.push_str(&pos.to_string());
                    }
                }
            }
        }
    }

    /// Decode the posting fields of one TSV row. Returns a description of the
    /// first malformed field; the caller attaches file and line context.
    pub fn parse_fields(
        fields: &[&str],
        positional: bool,
    ) -> std::result::Result<Self, String> {
        if positional {
            let mut docs = BTreeMap::new();
            for field in fields {
                let (id, positions) = field
                    .split_once(':')
                    .ok_or_else(|| format!("posting '{}' has no position list", field))?;
                let id: DocId = id
                    .parse()
                    .map_err(|_| format!("invalid document id '{}'", id))?;
                let positions = positions
                    .split(',')
                    .map(|p| {
                        p.parse::<u32>()
                            .map_err(|_| format!("invalid position '{}'", p))
                    })
                    .collect::<std::result::Result<Vec<u32>, String>>()?;
                docs.insert(id, positions);
            }
            Ok(TermPostings::Positional(docs))
        } else {
            let ids = fields
                .iter()
                .map(|field| {
                    field
                        .parse::<DocId>()
                        .map_err(|_| format!("invalid document id '{}'", field))
                })
                .collect::<std::result::Result<Vec<DocId>, String>>()?;
            Ok(TermPostings::Docs(ids))
        }
    }
}

/// Term-sorted map of postings with an explicit running posting count.
///
/// Used for three distinct roles: the block builder's accumulation structure,
/// the per-block staging maps during the merge, and the merge accumulator.
#[derive(Clone, Debug)]
pub struct PostingsMap {
    positional: bool,
    terms: BTreeMap<String, TermPostings>,
    postings: u64,
}

impl PostingsMap {
    pub fn new(positional: bool) -> Self {
        Self {
            positional,
            terms: BTreeMap::new(),
            postings: 0,
        }
    }

    pub fn positional(&self) -> bool {
        self.positional
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Running count of (term, document) postings held in the map.
    pub fn posting_count(&self) -> u64 {
        self.postings
    }

    /// Insert one document's terms. Returns the number of postings added.
    pub fn add_document(&mut self, doc_id: DocId, terms: &DocumentTerms) -> u64 {
        let added = terms.posting_count();
        match terms {
            DocumentTerms::Docs(terms) => {
                for term in terms {
                    match self.entry(term) {
                        TermPostings::Docs(ids) => ids.push(doc_id),
                        TermPostings::Positional(_) => unreachable!("map created docs-only"),
                    }
                }
            }
            DocumentTerms::Positional(terms) => {
                for (term, positions) in terms {
                    match self.entry(term) {
                        TermPostings::Positional(docs) => {
                            docs.insert(doc_id, positions.clone());
                        }
                        TermPostings::Docs(_) => unreachable!("map created positional"),
                    }
                }
            }
        }
        self.postings += added;
        added
    }

    /// Insert a whole postings list for a term read back from a temp block.
    /// The term must not be present yet: within one block file terms are
    /// unique, and staging maps drain fully merged terms before reuse.
    pub fn insert_term(&mut self, term: String, postings: TermPostings) {
        self.postings += postings.doc_count();
        let previous = self.terms.insert(term, postings);
        debug_assert!(previous.is_none(), "duplicate term staged from one block");
    }

    /// Union a term's postings into the map, accumulating across blocks.
    pub fn merge_term(&mut self, term: String, postings: TermPostings) {
        self.postings += postings.doc_count();
        match self.terms.get_mut(&term) {
            Some(existing) => existing.merge(postings),
            None => {
                self.terms.insert(term, postings);
            }
        }
    }

    /// Remove and return every term lexicographically at or below the
    /// boundary, preserving term order.
    pub fn drain_through(&mut self, boundary: &str) -> BTreeMap<String, TermPostings> {
        let mut remaining = self.terms.split_off(boundary);
        let boundary_entry = remaining.remove(boundary);
        let mut drained = std::mem::replace(&mut self.terms, remaining);
        if let Some(postings) = boundary_entry {
            drained.insert(boundary.to_string(), postings);
        }
        for postings in drained.values() {
            self.postings -= postings.doc_count();
        }
        drained
    }

    /// Remove and return all terms.
    pub fn drain_all(&mut self) -> BTreeMap<String, TermPostings> {
        self.postings = 0;
        std::mem::take(&mut self.terms)
    }

    /// Iterate terms in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &TermPostings)> {
        self.terms.iter()
    }

    pub fn get(&self, term: &str) -> Option<&TermPostings> {
        self.terms.get(term)
    }

    pub fn clear(&mut self) {
        self.terms.clear();
        self.postings = 0;
    }

    fn entry(&mut self, term: &str) -> &mut TermPostings {
        if !self.terms.contains_key(term) {
            self.terms
                .insert(term.to_string(), TermPostings::empty(self.positional));
        }
        self.terms.get_mut(term).unwrap()
    }
}
