//! Disk-resident inverted index: two-pass construction and read path
//!
//! # Architecture
//!
//! - `IndexBuilder`: Phase 1, streams the collection and writes the doc
//!   table, content store, and partitioned flat postings
//! - `IndexMerger`: Phase 2, consumes externally sorted postings and writes
//!   the block-compressed index plus lexicon and statistics
//! - `IndexReader`: loads the lexicon, stats, and per-document tables
//! - `PostingCursor`: block-at-a-time DAAT traversal over one posting list

mod builder;
mod doc_store;
mod lexicon;
mod merger;
mod postings;
mod reader;
mod stats;

pub use builder::*;
pub use doc_store::*;
pub use lexicon::*;
pub use merger::*;
pub use postings::*;
pub use reader::*;
pub use stats::*;

/// Index file names shared by both build phases and the read path
pub mod files {
    pub const DOC_TABLE: &str = "doc_table.txt";
    pub const DOC_CONTENT: &str = "doc_content.bin";
    pub const DOC_OFFSET: &str = "doc_offset.bin";
    pub const DOC_LEN: &str = "doc_len.bin";
    pub const LEXICON: &str = "lexicon.tsv";
    pub const STATS: &str = "stats.txt";
    pub const POSTINGS_DOCIDS: &str = "postings.docids.bin";
    pub const POSTINGS_FREQS: &str = "postings.freqs.bin";
}
