//! Per-document tables: lengths, external IDs, and stored content
//!
//! All three are written by the build phases and immutable afterwards. The
//! length and offset tables are loaded fully into memory; content records are
//! fetched from disk on demand, one freshly allocated buffer per lookup.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Result;

/// Document lengths from `doc_len.bin`, indexed by internal docID
#[derive(Debug, Default)]
pub struct DocLengths {
    lengths: Vec<u32>,
}

impl DocLengths {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        let lengths = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect::<Vec<_>>();
        info!(documents = lengths.len(), "loaded document lengths");
        Ok(Self { lengths })
    }

    /// Length in tokens, or 0 for an out-of-range docID
    pub fn get(&self, doc_id: u32) -> u32 {
        self.lengths.get(doc_id as usize).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }
}

/// Internal docID to external ID mapping from `doc_table.txt`
#[derive(Debug, Default)]
pub struct DocTable {
    external_ids: Vec<String>,
}

impl DocTable {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut external_ids: Vec<String> = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let parsed = line
                .split_once('\t')
                .and_then(|(id, ext)| id.parse::<u32>().ok().map(|id| (id, ext)));
            let Some((doc_id, external)) = parsed else {
                warn!(
                    line = line_no + 1,
                    "skipping malformed doc table line: {:?}", line
                );
                continue;
            };
            let idx = doc_id as usize;
            if idx >= external_ids.len() {
                external_ids.resize(idx + 1, String::new());
            }
            external_ids[idx] = external.to_string();
        }

        info!(documents = external_ids.len(), path = %path.display(), "loaded doc table");
        Ok(Self { external_ids })
    }

    pub fn get(&self, doc_id: u32) -> Option<&str> {
        self.external_ids.get(doc_id as usize).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.external_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.external_ids.is_empty()
    }
}

/// Content record locations from `doc_offset.bin`: packed `u64` offset plus
/// `u32` length, little-endian, one record per document. The stored length
/// excludes the `\n` separator that follows each record in the content file.
#[derive(Debug)]
pub struct ContentStore {
    content_path: PathBuf,
    offsets: Vec<(u64, u32)>,
}

impl ContentStore {
    pub fn open<P: AsRef<Path>>(content_path: P, offset_path: P) -> Result<Self> {
        let content_path = content_path.as_ref().to_path_buf();
        // Fail now rather than on first fetch
        File::open(&content_path)?;

        let bytes = fs::read(offset_path.as_ref())?;
        let offsets = bytes
            .chunks_exact(12)
            .map(|c| {
                let offset = u64::from_le_bytes([
                    c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7],
                ]);
                let length = u32::from_le_bytes([c[8], c[9], c[10], c[11]]);
                (offset, length)
            })
            .collect::<Vec<_>>();

        info!(documents = offsets.len(), "loaded content offsets");
        Ok(Self {
            content_path,
            offsets,
        })
    }

    /// Fetch the cleaned content bytes for a document
    ///
    /// Returns `None` for an out-of-range docID. Each call opens the content
    /// file and allocates a fresh buffer, so fetches from concurrent queries
    /// never share seek state.
    pub fn fetch(&self, doc_id: u32) -> Result<Option<Vec<u8>>> {
        let Some(&(offset, length)) = self.offsets.get(doc_id as usize) else {
            return Ok(None);
        };
        let mut file = File::open(&self.content_path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; length as usize];
        file.read_exact(&mut buf)?;
        Ok(Some(buf))
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}
