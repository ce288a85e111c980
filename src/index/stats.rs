use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use crate::error::Result;

/// Collection-level statistics loaded from `stats.txt`
///
/// The file is key/value lines separated by a tab; `#` lines are comments.
/// Only `doc_count` and `avgdl` are required by the query path; other keys
/// written by the merger are ignored here.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CollectionStats {
    /// Number of documents in the collection
    pub doc_count: u64,
    /// Mean document length in tokens
    pub avgdl: f64,
}

impl CollectionStats {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut stats = Self::default();
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('\t') else {
                continue;
            };
            match key {
                "doc_count" => {
                    if let Ok(v) = value.trim().parse() {
                        stats.doc_count = v;
                    }
                }
                "avgdl" => {
                    if let Ok(v) = value.trim().parse() {
                        stats.avgdl = v;
                    }
                }
                _ => {}
            }
        }

        info!(
            doc_count = stats.doc_count,
            avgdl = stats.avgdl,
            "loaded collection stats"
        );
        Ok(stats)
    }
}
