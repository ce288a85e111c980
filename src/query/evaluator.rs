//! Document-at-a-time query evaluation with BM25 top-K ranking
//!
//! OR mode scores the union of the posting lists by repeatedly picking the
//! smallest current docID; AND mode intersects by leapfrogging every cursor
//! to the largest current docID. Both feed a bounded min-heap that keeps the
//! K highest-scoring documents seen so far.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::QueryMode;
use crate::index::{IndexReader, PostingCursor};
use crate::scoring::{self, Bm25Params};
use crate::tokenizer;
use crate::Result;

/// One ranked result
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub doc_id: u32,
    pub score: f64,
}

/// Bounded min-heap entry ordered so the heap root is the eviction victim:
/// the lowest score, and among equal scores the largest docID.
#[derive(Clone, Copy, Debug, PartialEq)]
struct HeapEntry {
    doc_id: u32,
    score: f64,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.doc_id.cmp(&other.doc_id))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Top-K collector over monotone docID traversal
///
/// Admission is strict (`score > current minimum`), so among equal scores the
/// document encountered first, i.e. the smaller docID, keeps its seat.
struct TopK {
    heap: BinaryHeap<HeapEntry>,
    k: usize,
}

impl TopK {
    fn new(k: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(k + 1),
            k,
        }
    }

    fn offer(&mut self, doc_id: u32, score: f64) {
        if self.k == 0 {
            return;
        }
        if self.heap.len() < self.k {
            self.heap.push(HeapEntry { doc_id, score });
        } else if let Some(min) = self.heap.peek() {
            if score > min.score {
                self.heap.pop();
                self.heap.push(HeapEntry { doc_id, score });
            }
        }
    }

    /// Drain into descending-score order (ties: ascending docID)
    fn into_ranked(self) -> Vec<SearchHit> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|e| SearchHit {
                doc_id: e.doc_id,
                score: e.score,
            })
            .collect()
    }
}

/// BM25 query evaluator over a shared read-only index
///
/// The index tables are shared without locking; `k1`/`b` live behind a mutex
/// and are snapshotted once per query, so a reconfiguration never changes
/// scores mid-evaluation.
pub struct QueryEvaluator {
    reader: Arc<IndexReader>,
    params: Mutex<Bm25Params>,
}

impl QueryEvaluator {
    pub fn new(reader: Arc<IndexReader>) -> Self {
        Self::with_params(reader, Bm25Params::default())
    }

    pub fn with_params(reader: Arc<IndexReader>, params: Bm25Params) -> Self {
        Self {
            reader,
            params: Mutex::new(params),
        }
    }

    /// Replace the BM25 parameters used by subsequent queries
    pub fn set_params(&self, params: Bm25Params) {
        *self.params.lock() = params;
    }

    pub fn params(&self) -> Bm25Params {
        *self.params.lock()
    }

    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    /// Evaluate a free-text query and return the top-K hits, ranked
    ///
    /// Query tokens are deduplicated (repeated terms count once) and terms
    /// absent from the lexicon are dropped; if nothing survives, the result
    /// is empty.
    pub fn search(&self, query: &str, mode: QueryMode, k: usize) -> Result<Vec<SearchHit>> {
        let params = *self.params.lock();

        let mut seen = HashSet::new();
        let mut cursors: Vec<PostingCursor> = Vec::new();
        let mut idfs: Vec<f64> = Vec::new();
        let doc_count = self.reader.doc_count();

        for token in tokenizer::tokenize(query) {
            if !seen.insert(token.clone()) {
                continue;
            }
            let Some(meta) = self.reader.term_meta(&token) else {
                debug!(term = %token, "query term not in lexicon, dropped");
                continue;
            };
            let df = meta.df;
            if let Some(cursor) = self.reader.cursor(&token)? {
                cursors.push(cursor);
                idfs.push(scoring::idf(doc_count, df));
            }
        }

        if cursors.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let top = match mode {
            QueryMode::Or => self.evaluate_or(cursors, &idfs, k, &params),
            QueryMode::And => self.evaluate_and(cursors, &idfs, k, &params),
        };
        Ok(top.into_ranked())
    }

    fn evaluate_or(
        &self,
        mut cursors: Vec<PostingCursor>,
        idfs: &[f64],
        k: usize,
        params: &Bm25Params,
    ) -> TopK {
        let avgdl = self.reader.stats().avgdl;
        let mut top = TopK::new(k);

        loop {
            let mut min_doc = u32::MAX;
            let mut any = false;
            for cursor in &cursors {
                if cursor.valid() && (!any || cursor.doc() < min_doc) {
                    min_doc = cursor.doc();
                    any = true;
                }
            }
            if !any {
                break;
            }

            let dl = self.reader.doc_len(min_doc);
            let mut score = 0.0;
            for (cursor, &idf) in cursors.iter_mut().zip(idfs) {
                if cursor.valid() && cursor.doc() == min_doc {
                    score += scoring::score(idf, cursor.freq(), dl, avgdl, params);
                    cursor.next();
                }
            }
            top.offer(min_doc, score);
        }
        top
    }

    fn evaluate_and(
        &self,
        mut cursors: Vec<PostingCursor>,
        idfs: &[f64],
        k: usize,
        params: &Bm25Params,
    ) -> TopK {
        let avgdl = self.reader.stats().avgdl;
        let mut top = TopK::new(k);

        'outer: loop {
            if cursors.iter().any(|c| !c.valid()) {
                break;
            }
            let max_doc = cursors.iter().map(|c| c.doc()).max().unwrap_or(0);

            let mut aligned = true;
            for cursor in cursors.iter_mut() {
                if cursor.doc() < max_doc && !cursor.next_geq(max_doc) {
                    break 'outer;
                }
                if cursor.doc() > max_doc {
                    aligned = false;
                }
            }
            if !aligned {
                // Candidate failed: move everything strictly past it so the
                // next round starts from fresh ground
                for cursor in cursors.iter_mut() {
                    cursor.next_geq(max_doc + 1);
                }
                continue;
            }

            let dl = self.reader.doc_len(max_doc);
            let mut score = 0.0;
            for (cursor, &idf) in cursors.iter().zip(idfs) {
                score += scoring::score(idf, cursor.freq(), dl, avgdl, params);
            }
            top.offer(max_doc, score);

            for cursor in cursors.iter_mut() {
                cursor.next();
            }
        }
        top
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_entry_ordering() {
        let low = HeapEntry {
            doc_id: 1,
            score: 0.5,
        };
        let high = HeapEntry {
            doc_id: 2,
            score: 2.0,
        };
        // Lower score sorts greater, so the heap root is the worst entry
        assert!(low > high);

        // Equal scores: larger docID sorts greater (evicted first)
        let early = HeapEntry {
            doc_id: 3,
            score: 1.0,
        };
        let late = HeapEntry {
            doc_id: 7,
            score: 1.0,
        };
        assert!(late > early);
    }

    #[test]
    fn test_top_k_keeps_highest() {
        let mut top = TopK::new(2);
        top.offer(0, 1.0);
        top.offer(1, 3.0);
        top.offer(2, 2.0);
        top.offer(3, 0.5);

        let hits = top.into_ranked();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].doc_id, 1);
        assert_eq!(hits[1].doc_id, 2);
    }

    #[test]
    fn test_top_k_tie_keeps_earlier_doc() {
        let mut top = TopK::new(1);
        top.offer(4, 1.0);
        // Same score, later doc: strict admission keeps doc 4
        top.offer(9, 1.0);
        let hits = top.into_ranked();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, 4);
    }

    #[test]
    fn test_top_k_ranked_order() {
        let mut top = TopK::new(4);
        top.offer(10, 1.0);
        top.offer(11, 1.0);
        top.offer(12, 5.0);
        let hits = top.into_ranked();
        let ids: Vec<u32> = hits.iter().map(|h| h.doc_id).collect();
        // Descending score, ties by ascending docID
        assert_eq!(ids, vec![12, 10, 11]);
    }

    #[test]
    fn test_top_k_zero() {
        let mut top = TopK::new(0);
        top.offer(1, 1.0);
        assert!(top.into_ranked().is_empty());
    }
}
