use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::scoring::Bm25Params;

/// Phase-1 indexer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Byte budget for a single flat-postings partition file
    pub partition_budget_bytes: u64,
    /// Emit a progress log line every this many documents
    pub progress_interval: u64,
}

impl IndexerConfig {
    /// Build a config from a partition budget given in whole gigabytes
    pub fn with_partition_gb(gb: u64) -> Self {
        Self {
            partition_budget_bytes: gb.max(1) * 1024 * 1024 * 1024,
            ..Default::default()
        }
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            partition_budget_bytes: 2 * 1024 * 1024 * 1024,
            progress_interval: 10_000,
        }
    }
}

/// Boolean semantics for query evaluation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// Documents must contain every query term
    And,
    /// Documents may contain any query term
    #[default]
    Or,
}

impl FromStr for QueryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "and" => Ok(QueryMode::And),
            "or" => Ok(QueryMode::Or),
            other => Err(format!("unknown query mode '{}'", other)),
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryMode::And => write!(f, "and"),
            QueryMode::Or => write!(f, "or"),
        }
    }
}

/// Per-query search options
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchOptions {
    pub mode: QueryMode,
    /// Number of results to return
    pub k: usize,
    pub bm25: Bm25Params,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            mode: QueryMode::Or,
            k: 10,
            bm25: Bm25Params::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let indexer = IndexerConfig::default();
        assert_eq!(indexer.partition_budget_bytes, 2 * 1024 * 1024 * 1024);

        let options = SearchOptions::default();
        assert_eq!(options.mode, QueryMode::Or);
        assert_eq!(options.k, 10);
    }

    #[test]
    fn test_partition_gb() {
        let config = IndexerConfig::with_partition_gb(4);
        assert_eq!(config.partition_budget_bytes, 4 * 1024 * 1024 * 1024);

        // Budget is clamped to at least one gigabyte
        let config = IndexerConfig::with_partition_gb(0);
        assert_eq!(config.partition_budget_bytes, 1024 * 1024 * 1024);
    }

    #[test]
    fn test_query_mode_parsing() {
        assert_eq!("and".parse::<QueryMode>().unwrap(), QueryMode::And);
        assert_eq!("OR".parse::<QueryMode>().unwrap(), QueryMode::Or);
        assert!("xor".parse::<QueryMode>().is_err());
    }
}
