//! Watermark multi-way merge of temporary blocks into final blocks
//!
//! Each round reads a bounded slice of every temporary block into per-block
//! staging maps, then merges everything at or below the round's lexicographic
//! boundary into one accumulator. The boundary is the smallest frontier term
//! among blocks that read rows this round: every contributing cursor has
//! advanced at least to its own frontier, so all postings for terms at or
//! below the boundary are already staged. The accumulator flushes to a new
//! final block whenever it reaches the block threshold.

use std::cmp::Ordering;
use std::path::PathBuf;
use tracing::{debug, info};

use super::block::{final_block_path, temp_block_path, write_block, BlockCursor};
use super::master::MasterIndex;
use super::postings::PostingsMap;
use crate::error::{Result, SpimiError};

pub struct MergeEngine {
    dir: PathBuf,
    positional: bool,
    max_postings_per_block: u64,
    round_headroom: f64,
}

impl MergeEngine {
    pub fn new(
        dir: PathBuf,
        positional: bool,
        max_postings_per_block: u64,
        round_headroom: f64,
    ) -> Self {
        Self {
            dir,
            positional,
            max_postings_per_block,
            round_headroom,
        }
    }

    /// Per-round posting read budget for each block: the headroom fraction of
    /// the even split, clamped so every active cursor makes progress even
    /// when the threshold is smaller than the block count.
    fn round_budget(&self, temp_blocks: u32) -> u64 {
        let even_split = self.max_postings_per_block as f64 / temp_blocks as f64;
        ((even_split * self.round_headroom).floor() as u64).max(1)
    }

    /// Merge `temp_blocks` sorted temporary blocks holding `total_postings`
    /// postings into sequentially numbered final blocks, recording every term
    /// in the master index. Returns the number of final blocks written.
    ///
    /// All cursors are owned by this call and dropped on every exit path,
    /// including an error mid-merge.
    pub fn merge(
        &self,
        temp_blocks: u32,
        total_postings: u64,
        master: &mut MasterIndex,
    ) -> Result<u32> {
        if temp_blocks == 0 {
            return Ok(0);
        }

        let mut cursors = Vec::with_capacity(temp_blocks as usize);
        let mut staging = Vec::with_capacity(temp_blocks as usize);
        for n in 1..=temp_blocks {
            cursors.push(BlockCursor::open(
                &temp_block_path(&self.dir, n),
                self.positional,
            )?);
            staging.push(PostingsMap::new(self.positional));
        }

        let round_budget = self.round_budget(temp_blocks);
        let mut accumulator = PostingsMap::new(self.positional);
        let mut final_block = 1u32;
        let mut final_blocks_written = 0u32;
        let mut merged = 0u64;
        let mut round = 0u64;

        while merged < total_postings {
            round += 1;

            // Stage up to the round budget from every block that still has
            // rows. A block that reads nothing contributes no frontier and
            // never constrains the boundary.
            let mut boundary: Option<String> = None;
            for (cursor, stage) in cursors.iter_mut().zip(staging.iter_mut()) {
                if cursor.is_exhausted() {
                    continue;
                }
                let mut read = 0u64;
                let mut frontier: Option<String> = None;
                while read < round_budget {
                    match cursor.next_row()? {
                        Some((term, postings)) => {
                            read += postings.doc_count();
                            frontier = Some(term.clone());
                            stage.insert_term(term, postings);
                        }
                        None => break,
                    }
                }
                if let Some(frontier) = frontier {
                    boundary = match boundary {
                        Some(boundary) => match frontier.cmp(&boundary) {
                            Ordering::Less => Some(frontier),
                            _ => Some(boundary),
                        },
                        None => Some(frontier),
                    };
                }
            }

            // Merge staged terms at or below the boundary, in block order so
            // doc ids concatenate ascending. With every cursor exhausted the
            // boundary is unbounded and all staged leftovers drain.
            let merged_before = merged;
            for stage in staging.iter_mut() {
                let drained = match &boundary {
                    Some(boundary) => stage.drain_through(boundary),
                    None => stage.drain_all(),
                };
                for (term, postings) in drained {
                    let count = postings.doc_count();
                    merged += count;
                    master.record(&term, count, final_block);
                    accumulator.merge_term(term, postings);
                }
            }

            if merged == merged_before {
                // No rows staged and nothing drained: the temp blocks do not
                // add up to the posting total counted during indexing.
                return Err(SpimiError::IndexFormat {
                    path: self.dir.display().to_string(),
                    line: 0,
                    reason: format!(
                        "merge stalled after {} of {} postings; temporary blocks are inconsistent",
                        merged, total_postings
                    ),
                });
            }

            debug!(
                round,
                boundary = boundary.as_deref().unwrap_or("<end>"),
                merged,
                total_postings,
                "merge round complete"
            );

            if accumulator.posting_count() >= self.max_postings_per_block {
                let path = final_block_path(&self.dir, final_block);
                info!(
                    block = final_block,
                    terms = accumulator.term_count(),
                    postings = accumulator.posting_count(),
                    "flushing final block"
                );
                write_block(&path, &accumulator)?;
                accumulator.clear();
                final_blocks_written = final_block;
                final_block += 1;
            }
        }

        if !accumulator.is_empty() {
            let path = final_block_path(&self.dir, final_block);
            info!(
                block = final_block,
                terms = accumulator.term_count(),
                postings = accumulator.posting_count(),
                "flushing last final block"
            );
            write_block(&path, &accumulator)?;
            final_blocks_written = final_block;
        }

        Ok(final_blocks_written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    use super::super::postings::TermPostings;
    use crate::tokenizer::DocumentTerms;

    fn docs_terms(terms: &[&str]) -> DocumentTerms {
        DocumentTerms::Docs(terms.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>())
    }

    /// Write temp blocks from (doc_id, terms) batches and return the total
    /// posting count.
    fn write_temp_blocks(dir: &std::path::Path, batches: &[&[(u32, &[&str])]]) -> u64 {
        let mut total = 0;
        for (i, batch) in batches.iter().enumerate() {
            let mut map = PostingsMap::new(false);
            for (doc_id, terms) in batch.iter() {
                total += map.add_document(*doc_id, &docs_terms(terms));
            }
            write_block(&temp_block_path(dir, (i + 1) as u32), &map).unwrap();
        }
        total
    }

    fn read_final_blocks(dir: &std::path::Path, count: u32) -> Vec<Vec<(String, TermPostings)>> {
        (1..=count)
            .map(|k| {
                let mut cursor = BlockCursor::open(&final_block_path(dir, k), false).unwrap();
                let mut rows = Vec::new();
                while let Some(row) = cursor.next_row().unwrap() {
                    rows.push(row);
                }
                rows
            })
            .collect()
    }

    #[test]
    fn test_round_budget_clamps_to_one() {
        let engine = MergeEngine::new(PathBuf::from("."), false, 1, 0.7);
        assert_eq!(engine.round_budget(4), 1);

        let engine = MergeEngine::new(PathBuf::from("."), false, 1_000_000, 0.7);
        assert_eq!(engine.round_budget(10), 70_000);
    }

    #[test]
    fn test_merge_zero_blocks() {
        let engine = MergeEngine::new(PathBuf::from("."), false, 10, 0.7);
        let mut master = MasterIndex::new();
        assert_eq!(engine.merge(0, 0, &mut master).unwrap(), 0);
    }

    #[test]
    fn test_single_block_drains_trivially() {
        let tmp = TempDir::new().unwrap();
        let total = write_temp_blocks(tmp.path(), &[&[(1, &["cat", "sat"]), (2, &["dog"])]]);

        let engine = MergeEngine::new(tmp.path().to_path_buf(), false, 1_000_000, 0.7);
        let mut master = MasterIndex::new();
        let final_blocks = engine.merge(1, total, &mut master).unwrap();

        assert_eq!(final_blocks, 1);
        let blocks = read_final_blocks(tmp.path(), 1);
        let terms: Vec<&str> = blocks[0].iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(terms, vec!["cat", "dog", "sat"]);
        assert_eq!(master.get("cat").unwrap().doc_frequency, 1);
    }

    #[test]
    fn test_split_posting_lists_reassemble() {
        let tmp = TempDir::new().unwrap();
        // "sat" is split across all three temp blocks.
        let total = write_temp_blocks(
            tmp.path(),
            &[
                &[(1, &["cat", "sat"])],
                &[(2, &["dog", "sat"])],
                &[(3, &["sat"])],
            ],
        );

        let engine = MergeEngine::new(tmp.path().to_path_buf(), false, 1_000_000, 0.7);
        let mut master = MasterIndex::new();
        let final_blocks = engine.merge(3, total, &mut master).unwrap();

        assert_eq!(final_blocks, 1);
        let blocks = read_final_blocks(tmp.path(), 1);
        let sat = blocks[0]
            .iter()
            .find(|(t, _)| t == "sat")
            .map(|(_, p)| p.clone())
            .unwrap();
        assert_eq!(sat, TermPostings::Docs(vec![1, 2, 3]));
        assert_eq!(master.get("sat").unwrap().doc_frequency, 3);
    }

    #[test]
    fn test_conservation_and_global_order_small_threshold() {
        let tmp = TempDir::new().unwrap();
        let total = write_temp_blocks(
            tmp.path(),
            &[
                &[(1, &["ant", "bee", "cow"]), (2, &["ant", "fox"])],
                &[(3, &["bee", "cow", "owl"]), (4, &["ant", "owl"])],
            ],
        );
        assert_eq!(total, 10);

        // Threshold of 3 forces several final blocks.
        let engine = MergeEngine::new(tmp.path().to_path_buf(), false, 3, 0.7);
        let mut master = MasterIndex::new();
        let final_blocks = engine.merge(2, total, &mut master).unwrap();
        assert!(final_blocks > 1);

        let blocks = read_final_blocks(tmp.path(), final_blocks);
        let merged_total: u64 = blocks
            .iter()
            .flatten()
            .map(|(_, p)| p.doc_count())
            .sum();
        assert_eq!(merged_total, total);

        // Terms ascend strictly within and across blocks; no duplicates.
        let all_terms: Vec<&str> = blocks
            .iter()
            .flatten()
            .map(|(t, _)| t.as_str())
            .collect();
        let mut sorted = all_terms.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(all_terms, sorted);

        // Master block numbers point at the block physically holding the term.
        for (k, block) in blocks.iter().enumerate() {
            for (term, _) in block {
                assert_eq!(master.get(term).unwrap().block, (k + 1) as u32);
            }
        }
    }

    #[test]
    fn test_uneven_blocks_exhausted_early() {
        let tmp = TempDir::new().unwrap();
        // Block 2 is tiny and exhausts on the first round; its terms must
        // still merge, and it must not constrain later boundaries.
        let total = write_temp_blocks(
            tmp.path(),
            &[
                &[
                    (1, &["apple", "mango", "peach", "plum"]),
                    (2, &["apple", "zebra"]),
                ],
                &[(3, &["banana"])],
            ],
        );

        let engine = MergeEngine::new(tmp.path().to_path_buf(), false, 4, 0.7);
        let mut master = MasterIndex::new();
        let final_blocks = engine.merge(2, total, &mut master).unwrap();

        let blocks = read_final_blocks(tmp.path(), final_blocks);
        let merged_total: u64 = blocks.iter().flatten().map(|(_, p)| p.doc_count()).sum();
        assert_eq!(merged_total, total);
        assert_eq!(master.get("banana").unwrap().doc_frequency, 1);
        assert_eq!(master.get("zebra").unwrap().doc_frequency, 1);
    }

    #[test]
    fn test_stalled_merge_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let total = write_temp_blocks(tmp.path(), &[&[(1, &["cat"])]]);

        let engine = MergeEngine::new(tmp.path().to_path_buf(), false, 10, 0.7);
        let mut master = MasterIndex::new();
        // Claiming more postings than the blocks hold must fail, not loop.
        let result = engine.merge(1, total + 5, &mut master);
        assert!(matches!(result, Err(SpimiError::IndexFormat { .. })));
    }
}
