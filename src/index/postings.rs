//! Block-at-a-time posting list cursor
//!
//! Posting lists are stored as parallel streams: `postings.docids.bin` holds
//! blocks of `varbyte(L), varbyte(first docID), varbyte(L-1 gaps)` and
//! `postings.freqs.bin` holds `varbyte(L), varbyte(L frequencies)`. A cursor
//! seeks both streams to the offsets recorded in the lexicon and buffers
//! exactly one decoded block at a time.
//!
//! A block whose two `L` values disagree is corrupt: the cursor logs the
//! mismatch and exhausts itself, leaving the rest of the query untouched.

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::Path;

use tracing::warn;

use super::lexicon::TermMeta;
use crate::codec;
use crate::error::{KrillError, Result};

/// Number of postings per compressed block (the last block may be shorter)
pub const BLOCK_SIZE: usize = 128;

/// DAAT cursor over one term's posting list
///
/// The cursor owns its own file handles, so concurrent queries never share
/// seek positions. While `valid()`, `doc()` and `freq()` return the current
/// posting; `next()` and `next_geq()` advance in strictly increasing docID
/// order until the list is exhausted.
pub struct PostingCursor {
    docids: BufReader<File>,
    freqs: BufReader<File>,
    total_blocks: u32,
    blocks_loaded: u32,
    docids_buf: Vec<u32>,
    freqs_buf: Vec<u32>,
    block_pos: usize,
    live: bool,
}

impl PostingCursor {
    /// Open a cursor positioned on the first posting of the list
    pub fn open<P: AsRef<Path>>(docids_path: P, freqs_path: P, meta: &TermMeta) -> Result<Self> {
        let mut docids = BufReader::new(File::open(docids_path.as_ref())?);
        let mut freqs = BufReader::new(File::open(freqs_path.as_ref())?);
        docids.seek(SeekFrom::Start(meta.docids_offset))?;
        freqs.seek(SeekFrom::Start(meta.freqs_offset))?;

        let mut cursor = Self {
            docids,
            freqs,
            total_blocks: meta.blocks,
            blocks_loaded: 0,
            docids_buf: Vec::with_capacity(BLOCK_SIZE),
            freqs_buf: Vec::with_capacity(BLOCK_SIZE),
            block_pos: 0,
            live: true,
        };
        if !cursor.load_next_block() {
            cursor.live = false;
        }
        Ok(cursor)
    }

    /// Whether the cursor currently points at a posting
    pub fn valid(&self) -> bool {
        self.live
    }

    /// Current docID; meaningful only while `valid()`
    pub fn doc(&self) -> u32 {
        self.docids_buf[self.block_pos]
    }

    /// Current term frequency; meaningful only while `valid()`
    pub fn freq(&self) -> u32 {
        self.freqs_buf[self.block_pos]
    }

    /// Advance to the next posting; returns `false` once exhausted
    pub fn next(&mut self) -> bool {
        if !self.live {
            return false;
        }
        self.block_pos += 1;
        if self.block_pos < self.docids_buf.len() {
            return true;
        }
        if self.load_next_block() {
            return true;
        }
        self.live = false;
        false
    }

    /// Advance to the first posting with `doc() >= target`
    pub fn next_geq(&mut self, target: u32) -> bool {
        while self.live && self.doc() < target {
            if !self.next() {
                return false;
            }
        }
        self.live
    }

    /// Decode the next block from both streams into the buffers
    ///
    /// Returns `false` when the list is fully consumed or a block is corrupt;
    /// in the corrupt case the cursor is dead from here on.
    fn load_next_block(&mut self) -> bool {
        if self.blocks_loaded >= self.total_blocks {
            return false;
        }
        match self.try_load_block() {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!("posting block unreadable, dropping cursor: {err}");
                self.blocks_loaded = self.total_blocks;
                false
            }
        }
    }

    fn try_load_block(&mut self) -> Result<bool> {
        let len = codec::read_u32(&mut self.docids)?;

        self.docids_buf.clear();
        let mut prev = 0u32;
        for i in 0..len {
            let gap = codec::read_u32(&mut self.docids)?;
            let doc_id = if i == 0 { gap } else { prev + gap };
            self.docids_buf.push(doc_id);
            prev = doc_id;
        }

        let freqs_len = codec::read_u32(&mut self.freqs)?;
        if freqs_len != len {
            return Err(KrillError::BlockLengthMismatch {
                docids_len: len,
                freqs_len,
            });
        }
        self.freqs_buf.clear();
        for _ in 0..len {
            self.freqs_buf.push(codec::read_u32(&mut self.freqs)?);
        }

        self.block_pos = 0;
        self.blocks_loaded += 1;
        Ok(len > 0)
    }
}
