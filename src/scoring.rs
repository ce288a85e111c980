//! BM25 ranking primitives
//!
//! Robertson/Sparck Jones IDF with +0.5 smoothing and the "+1" shift that
//! keeps every value non-negative, plus the standard term-frequency
//! saturation / length normalization combination. All arithmetic is f64.

use serde::{Deserialize, Serialize};

/// BM25 parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term frequency saturation parameter
    pub k1: f64,
    /// Document length normalization parameter
    pub b: f64,
}

impl Bm25Params {
    pub fn new(k1: f64, b: f64) -> Self {
        Self { k1, b }
    }
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 0.9, b: 0.4 }
    }
}

/// Compute inverse document frequency for a term
///
/// `idf = ln((N - df + 0.5) / (df + 0.5) + 1)`, zero when the collection is
/// empty or the term is absent.
pub fn idf(doc_count: u64, df: u32) -> f64 {
    if doc_count == 0 || df == 0 {
        return 0.0;
    }
    let n = doc_count as f64;
    let df = df as f64;
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// Compute the BM25 contribution of one term in one document
///
/// `score = idf * tf * (k1 + 1) / (tf + k1 * (1 - b + b * dl / avgdl))`
pub fn score(idf: f64, tf: u32, dl: u32, avgdl: f64, params: &Bm25Params) -> f64 {
    if tf == 0 || dl == 0 || avgdl == 0.0 {
        return 0.0;
    }
    let tf = tf as f64;
    let dl = dl as f64;

    let numerator = tf * (params.k1 + 1.0);
    let denominator = tf + params.k1 * (1.0 - params.b + params.b * dl / avgdl);
    idf * (numerator / denominator)
}
