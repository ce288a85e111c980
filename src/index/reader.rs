//! Read-only index root
//!
//! Loads the lexicon, collection statistics, document lengths, doc table,
//! and content offsets once. The loaded tables are immutable and can be
//! shared across concurrent queries without locking; posting cursors and
//! content fetches open their own file handles per call.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use super::doc_store::{ContentStore, DocLengths, DocTable};
use super::files;
use super::lexicon::{Lexicon, TermMeta};
use super::postings::PostingCursor;
use super::stats::CollectionStats;
use crate::error::{KrillError, Result};

pub struct IndexReader {
    lexicon: Lexicon,
    stats: CollectionStats,
    doc_lengths: DocLengths,
    doc_table: DocTable,
    content: ContentStore,
    docids_path: PathBuf,
    freqs_path: PathBuf,
}

impl IndexReader {
    /// Open an index directory plus its doc table
    ///
    /// The content store files (`doc_content.bin`, `doc_offset.bin`) are
    /// expected next to the doc table, where Phase 1 wrote them. Any missing
    /// file is an error here rather than at query time.
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(index_dir: P, doc_table_path: Q) -> Result<Self> {
        let index_dir = index_dir.as_ref();
        let doc_table_path = doc_table_path.as_ref();
        let doc_dir = doc_table_path.parent().ok_or_else(|| {
            KrillError::IndexError(format!(
                "doc table path {} has no parent directory",
                doc_table_path.display()
            ))
        })?;

        let lexicon = Lexicon::load(index_dir.join(files::LEXICON))?;
        let stats = CollectionStats::load(index_dir.join(files::STATS))?;
        let doc_lengths = DocLengths::load(index_dir.join(files::DOC_LEN))?;
        let doc_table = DocTable::load(doc_table_path)?;
        let content = ContentStore::open(
            doc_dir.join(files::DOC_CONTENT),
            doc_dir.join(files::DOC_OFFSET),
        )?;

        let docids_path = index_dir.join(files::POSTINGS_DOCIDS);
        let freqs_path = index_dir.join(files::POSTINGS_FREQS);
        // Surface missing posting files at startup, not mid-query
        std::fs::File::open(&docids_path)?;
        std::fs::File::open(&freqs_path)?;

        info!(
            terms = lexicon.len(),
            documents = stats.doc_count,
            "index loaded"
        );
        Ok(Self {
            lexicon,
            stats,
            doc_lengths,
            doc_table,
            content,
            docids_path,
            freqs_path,
        })
    }

    /// Convenience constructor for sharing across query workers
    pub fn open_shared<P: AsRef<Path>, Q: AsRef<Path>>(
        index_dir: P,
        doc_table_path: Q,
    ) -> Result<Arc<Self>> {
        Ok(Arc::new(Self::open(index_dir, doc_table_path)?))
    }

    pub fn stats(&self) -> CollectionStats {
        self.stats
    }

    pub fn term_meta(&self, term: &str) -> Option<&TermMeta> {
        self.lexicon.get(term)
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Open a posting cursor for a term, or `None` if the term is unknown
    ///
    /// Every call yields an independent cursor with its own file handles.
    pub fn cursor(&self, term: &str) -> Result<Option<PostingCursor>> {
        match self.lexicon.get(term) {
            Some(meta) => Ok(Some(PostingCursor::open(
                &self.docids_path,
                &self.freqs_path,
                meta,
            )?)),
            None => Ok(None),
        }
    }

    /// Document length in tokens; 0 for an out-of-range docID
    pub fn doc_len(&self, doc_id: u32) -> u32 {
        self.doc_lengths.get(doc_id)
    }

    pub fn external_id(&self, doc_id: u32) -> Option<&str> {
        self.doc_table.get(doc_id)
    }

    /// Fetch the stored content bytes for a document (freshly allocated)
    pub fn content(&self, doc_id: u32) -> Result<Option<Vec<u8>>> {
        self.content.fetch(doc_id)
    }

    pub fn doc_count(&self) -> u64 {
        self.stats.doc_count
    }

    pub fn term_count(&self) -> usize {
        self.lexicon.len()
    }
}
