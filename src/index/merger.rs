//! Phase 2: merge sorted postings into the block-compressed index
//!
//! Input is the externally sorted `term \t docID \t tf` stream. Postings are
//! grouped by term and each term's list is written in blocks of up to 128
//! postings: the docids stream stores `varbyte(L), first docID, L-1 gaps`,
//! the freqs stream `varbyte(L), L frequencies`. Alongside the two binary
//! files the merger emits the lexicon, the document length table, and the
//! collection statistics needed for BM25.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::files;
use super::postings::BLOCK_SIZE;
use crate::codec;
use crate::error::Result;

const PROGRESS_INTERVAL: u64 = 10_000_000;

/// Counters reported after a Phase-2 run
#[derive(Clone, Copy, Debug, Default)]
pub struct MergeSummary {
    pub terms: u64,
    pub postings: u64,
    pub documents: u64,
    pub avgdl: f64,
}

/// Streaming Phase-2 merger
pub struct IndexMerger {
    out_dir: PathBuf,

    docids: BufWriter<File>,
    docids_pos: u64,
    freqs: BufWriter<File>,
    freqs_pos: u64,
    lexicon: BufWriter<File>,

    doc_lengths: Vec<u32>,
    doc_count: u64,
    total_terms: u64,
    total_postings: u64,
}

impl IndexMerger {
    /// Create the output directory and open the index output files
    pub fn create<P: AsRef<Path>>(out_dir: P) -> Result<Self> {
        let out_dir = out_dir.as_ref().to_path_buf();
        fs::create_dir_all(&out_dir)?;

        let docids = BufWriter::new(File::create(out_dir.join(files::POSTINGS_DOCIDS))?);
        let freqs = BufWriter::new(File::create(out_dir.join(files::POSTINGS_FREQS))?);
        let mut lexicon = BufWriter::new(File::create(out_dir.join(files::LEXICON))?);
        writeln!(
            lexicon,
            "# term\tdf\tcf\tdocids_offset\tfreqs_offset\tblocks"
        )?;

        Ok(Self {
            out_dir,
            docids,
            docids_pos: 0,
            freqs,
            freqs_pos: 0,
            lexicon,
            doc_lengths: Vec::new(),
            doc_count: 0,
            total_terms: 0,
            total_postings: 0,
        })
    }

    /// Consume a sorted postings file and write the complete index
    pub fn merge_file<P: AsRef<Path>>(mut self, sorted: P) -> Result<MergeSummary> {
        let sorted = sorted.as_ref();
        let reader = BufReader::new(File::open(sorted)?);
        info!(input = %sorted.display(), out_dir = %self.out_dir.display(), "merging sorted postings (phase 2)");

        let mut current_term = String::new();
        let mut buffer: Vec<(u32, u32)> = Vec::with_capacity(1024);
        let mut lines_seen = 0u64;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((term, doc_id, tf)) = parse_posting(&line) else {
                warn!(line = line_no + 1, "skipping malformed posting: {:?}", line);
                continue;
            };

            if doc_id as u64 >= self.doc_count {
                self.doc_count = doc_id as u64 + 1;
            }

            if term != current_term {
                if !buffer.is_empty() {
                    self.flush_term(&current_term, &buffer)?;
                    buffer.clear();
                }
                current_term.clear();
                current_term.push_str(term);
            } else if let Some(&(last_doc, _)) = buffer.last() {
                // The external sort guarantees ascending unique docIDs per term
                if doc_id <= last_doc {
                    warn!(
                        line = line_no + 1,
                        term, doc_id, "posting out of order, skipping"
                    );
                    continue;
                }
            }
            buffer.push((doc_id, tf));

            lines_seen += 1;
            if lines_seen % PROGRESS_INTERVAL == 0 {
                info!(
                    postings = lines_seen,
                    terms = self.total_terms,
                    "merge progress"
                );
            }
        }
        if !buffer.is_empty() {
            self.flush_term(&current_term, &buffer)?;
        }

        self.finish()
    }

    /// Write one term's posting list in compressed blocks plus its lexicon row
    fn flush_term(&mut self, term: &str, postings: &[(u32, u32)]) -> Result<()> {
        let docids_offset = self.docids_pos;
        let freqs_offset = self.freqs_pos;

        let df = postings.len() as u32;
        let mut cf = 0u64;
        let mut blocks = 0u32;
        let mut scratch = Vec::with_capacity(BLOCK_SIZE * 5);

        for chunk in postings.chunks(BLOCK_SIZE) {
            scratch.clear();
            codec::encode_into(chunk.len() as u32, &mut scratch);
            let mut prev = 0u32;
            for (i, &(doc_id, _)) in chunk.iter().enumerate() {
                let gap = if i == 0 { doc_id } else { doc_id - prev };
                codec::encode_into(gap, &mut scratch);
                prev = doc_id;
            }
            self.docids.write_all(&scratch)?;
            self.docids_pos += scratch.len() as u64;

            scratch.clear();
            codec::encode_into(chunk.len() as u32, &mut scratch);
            for &(doc_id, tf) in chunk {
                codec::encode_into(tf, &mut scratch);
                cf += tf as u64;
                let idx = doc_id as usize;
                if idx >= self.doc_lengths.len() {
                    self.doc_lengths.resize(idx + 1, 0);
                }
                self.doc_lengths[idx] += tf;
            }
            self.freqs.write_all(&scratch)?;
            self.freqs_pos += scratch.len() as u64;

            blocks += 1;
        }

        writeln!(
            self.lexicon,
            "{}\t{}\t{}\t{}\t{}\t{}",
            term, df, cf, docids_offset, freqs_offset, blocks
        )?;
        self.total_terms += 1;
        self.total_postings += df as u64;
        Ok(())
    }

    /// Write `doc_len.bin` and `stats.txt`, flush everything, report totals
    fn finish(mut self) -> Result<MergeSummary> {
        self.docids.flush()?;
        self.freqs.flush()?;
        self.lexicon.flush()?;

        if self.doc_lengths.len() < self.doc_count as usize {
            self.doc_lengths.resize(self.doc_count as usize, 0);
        }
        let mut doc_len = BufWriter::new(File::create(self.out_dir.join(files::DOC_LEN))?);
        for &len in &self.doc_lengths {
            doc_len.write_all(&len.to_le_bytes())?;
        }
        doc_len.flush()?;

        let total_doc_length: u64 = self.doc_lengths.iter().map(|&l| l as u64).sum();
        let avgdl = if self.doc_count > 0 {
            total_doc_length as f64 / self.doc_count as f64
        } else {
            0.0
        };

        let mut stats = BufWriter::new(File::create(self.out_dir.join(files::STATS))?);
        writeln!(stats, "# Index statistics")?;
        writeln!(stats, "doc_count\t{}", self.doc_count)?;
        writeln!(stats, "total_terms\t{}", self.total_terms)?;
        writeln!(stats, "total_postings\t{}", self.total_postings)?;
        writeln!(stats, "avgdl\t{}", avgdl)?;
        writeln!(stats, "total_doc_length\t{}", total_doc_length)?;
        stats.flush()?;

        let summary = MergeSummary {
            terms: self.total_terms,
            postings: self.total_postings,
            documents: self.doc_count,
            avgdl,
        };
        info!(
            terms = summary.terms,
            postings = summary.postings,
            documents = summary.documents,
            avgdl = summary.avgdl,
            "phase 2 complete"
        );
        Ok(summary)
    }
}

fn parse_posting(line: &str) -> Option<(&str, u32, u32)> {
    let mut fields = line.split('\t');
    let term = fields.next()?;
    let doc_id = fields.next()?.parse().ok()?;
    let tf = fields.next()?.parse().ok()?;
    if term.is_empty() || fields.next().is_some() {
        return None;
    }
    Some((term, doc_id, tf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::lexicon::Lexicon;
    use crate::index::postings::PostingCursor;
    use crate::index::stats::CollectionStats;
    use tempfile::TempDir;

    fn merge_lines(lines: &str) -> (TempDir, MergeSummary) {
        let dir = TempDir::new().unwrap();
        let sorted = dir.path().join("postings_sorted.tsv");
        fs::write(&sorted, lines).unwrap();
        let out = dir.path().join("index");
        let summary = IndexMerger::create(&out).unwrap().merge_file(&sorted).unwrap();
        (dir, summary)
    }

    #[test]
    fn test_parse_posting() {
        assert_eq!(parse_posting("cat\t3\t2"), Some(("cat", 3, 2)));
        assert_eq!(parse_posting("cat\t3"), None);
        assert_eq!(parse_posting("cat\t3\tx"), None);
        assert_eq!(parse_posting("cat\t3\t2\t9"), None);
    }

    #[test]
    fn test_merge_small_collection() {
        // Postings for: D0 = "cat dog cat", D1 = "dog bird"
        let (dir, summary) =
            merge_lines("bird\t1\t1\ncat\t0\t2\ndog\t0\t1\ndog\t1\t1\n");
        assert_eq!(summary.terms, 3);
        assert_eq!(summary.postings, 4);
        assert_eq!(summary.documents, 2);

        let out = dir.path().join("index");
        let lexicon = Lexicon::load(out.join(files::LEXICON)).unwrap();
        let dog = lexicon.get("dog").unwrap();
        assert_eq!(dog.df, 2);
        assert_eq!(dog.cf, 2);
        assert_eq!(dog.blocks, 1);
        let cat = lexicon.get("cat").unwrap();
        assert_eq!((cat.df, cat.cf), (1, 2));

        let stats = CollectionStats::load(out.join(files::STATS)).unwrap();
        assert_eq!(stats.doc_count, 2);
        // dl(D0) = 3, dl(D1) = 2
        assert!((stats.avgdl - 2.5).abs() < 1e-12);

        let doc_len = fs::read(out.join(files::DOC_LEN)).unwrap();
        assert_eq!(doc_len, [3u32.to_le_bytes(), 2u32.to_le_bytes()].concat());

        // Walk a posting list back out through the cursor
        let mut cursor = PostingCursor::open(
            out.join(files::POSTINGS_DOCIDS),
            out.join(files::POSTINGS_FREQS),
            dog,
        )
        .unwrap();
        assert_eq!((cursor.doc(), cursor.freq()), (0, 1));
        assert!(cursor.next());
        assert_eq!((cursor.doc(), cursor.freq()), (1, 1));
        assert!(!cursor.next());
    }

    #[test]
    fn test_merge_skips_comments_and_malformed() {
        let (dir, summary) =
            merge_lines("# sorted postings\n\ncat\t0\t1\nnonsense line\ncat\t2\t3\n");
        assert_eq!(summary.terms, 1);
        assert_eq!(summary.postings, 2);
        assert_eq!(summary.documents, 3);

        let out = dir.path().join("index");
        let lexicon = Lexicon::load(out.join(files::LEXICON)).unwrap();
        assert_eq!(lexicon.get("cat").unwrap().cf, 4);
        // Doc 1 never appears in a posting; its length is zero-filled
        let doc_len = fs::read(out.join(files::DOC_LEN)).unwrap();
        assert_eq!(doc_len.len(), 12);
        assert_eq!(u32::from_le_bytes(doc_len[4..8].try_into().unwrap()), 0);
    }

    #[test]
    fn test_merge_multi_block_term() {
        // 257 postings force three blocks (128 + 128 + 1)
        let mut lines = String::new();
        for i in 0..257u32 {
            lines.push_str(&format!("term\t{}\t1\n", i * 2));
        }
        let (dir, summary) = merge_lines(&lines);
        assert_eq!(summary.postings, 257);

        let out = dir.path().join("index");
        let lexicon = Lexicon::load(out.join(files::LEXICON)).unwrap();
        let meta = lexicon.get("term").unwrap();
        assert_eq!(meta.df, 257);
        assert_eq!(meta.blocks, 3);
    }

    #[test]
    fn test_out_of_order_posting_dropped() {
        let (dir, summary) = merge_lines("cat\t5\t1\ncat\t3\t1\ncat\t9\t1\n");
        assert_eq!(summary.postings, 2);
        let out = dir.path().join("index");
        let lexicon = Lexicon::load(out.join(files::LEXICON)).unwrap();
        assert_eq!(lexicon.get("cat").unwrap().df, 2);
    }

    #[test]
    fn test_empty_input() {
        let (dir, summary) = merge_lines("");
        assert_eq!(summary.terms, 0);
        assert_eq!(summary.documents, 0);
        assert_eq!(summary.avgdl, 0.0);
        let out = dir.path().join("index");
        let stats = CollectionStats::load(out.join(files::STATS)).unwrap();
        assert_eq!(stats.doc_count, 0);
        assert_eq!(stats.avgdl, 0.0);
    }
}
