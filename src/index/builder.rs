//! Phase 1: stream the collection into flat postings and document tables
//!
//! Input is a tab-separated file of `externalID \t content` lines. Each
//! document gets the next internal docID; the builder writes the doc table,
//! the cleaned content store, and `term \t docID \t tf` posting lines split
//! across partition files by a byte budget. An external sort then turns the
//! partitions into the single sorted stream Phase 2 consumes.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use super::files;
use crate::config::IndexerConfig;
use crate::error::Result;
use crate::tokenizer;

/// Counters reported after a Phase-1 run
#[derive(Clone, Copy, Debug, Default)]
pub struct BuildSummary {
    /// Documents ingested
    pub documents: u64,
    /// Posting lines written across all partitions
    pub postings: u64,
    /// Partition files produced
    pub partitions: u32,
    /// Input lines skipped for having no tab separator
    pub skipped_lines: u64,
}

/// Streaming Phase-1 index builder
pub struct IndexBuilder {
    out_dir: PathBuf,
    config: IndexerConfig,

    doc_table: BufWriter<File>,
    content: BufWriter<File>,
    offsets: BufWriter<File>,
    partition: BufWriter<File>,

    next_doc_id: u32,
    content_pos: u64,
    partition_index: u32,
    partition_bytes: u64,
    postings_written: u64,
    skipped_lines: u64,
}

impl IndexBuilder {
    /// Create the output directory and open all Phase-1 output files
    pub fn create<P: AsRef<Path>>(out_dir: P, config: IndexerConfig) -> Result<Self> {
        let out_dir = out_dir.as_ref().to_path_buf();
        fs::create_dir_all(&out_dir)?;

        let doc_table = BufWriter::new(File::create(out_dir.join(files::DOC_TABLE))?);
        let content = BufWriter::new(File::create(out_dir.join(files::DOC_CONTENT))?);
        let offsets = BufWriter::new(File::create(out_dir.join(files::DOC_OFFSET))?);
        let partition = BufWriter::new(File::create(partition_path(&out_dir, 0))?);

        Ok(Self {
            out_dir,
            config,
            doc_table,
            content,
            offsets,
            partition,
            next_doc_id: 0,
            content_pos: 0,
            partition_index: 0,
            partition_bytes: 0,
            postings_written: 0,
            skipped_lines: 0,
        })
    }

    /// Ingest a whole collection file, then finalize
    pub fn build_from_tsv<P: AsRef<Path>>(mut self, input: P) -> Result<BuildSummary> {
        let input = input.as_ref();
        let reader = BufReader::new(File::open(input)?);
        info!(input = %input.display(), out_dir = %self.out_dir.display(), "building index (phase 1)");

        for line in reader.lines() {
            let line = line?;
            let Some((external_id, content)) = line.split_once('\t') else {
                self.skipped_lines += 1;
                continue;
            };
            self.add_document(external_id, content)?;
        }
        self.finish()
    }

    /// Ingest one document, assigning it the next internal docID
    pub fn add_document(&mut self, external_id: &str, content: &str) -> Result<()> {
        let doc_id = self.next_doc_id;
        self.next_doc_id += 1;

        writeln!(self.doc_table, "{}\t{}", doc_id, external_id)?;
        self.store_content(content)?;

        for (term, tf) in tokenizer::term_frequencies(content) {
            let line = format!("{}\t{}\t{}\n", term, doc_id, tf);
            self.partition.write_all(line.as_bytes())?;
            self.partition_bytes += line.len() as u64;
            self.postings_written += 1;
        }
        if self.partition_bytes > self.config.partition_budget_bytes {
            self.rotate_partition()?;
        }

        if self.next_doc_id as u64 % self.config.progress_interval == 0 {
            info!(documents = self.next_doc_id, "indexed");
        }
        Ok(())
    }

    /// Flush all writers and report totals
    pub fn finish(mut self) -> Result<BuildSummary> {
        self.doc_table.flush()?;
        self.content.flush()?;
        self.offsets.flush()?;
        self.partition.flush()?;

        let summary = BuildSummary {
            documents: self.next_doc_id as u64,
            postings: self.postings_written,
            partitions: self.partition_index + 1,
            skipped_lines: self.skipped_lines,
        };
        info!(
            documents = summary.documents,
            postings = summary.postings,
            partitions = summary.partitions,
            skipped = summary.skipped_lines,
            "phase 1 complete"
        );
        Ok(summary)
    }

    /// Write the cleaned content record and its offset entry
    ///
    /// Tabs, newlines, and carriage returns each become one space; the
    /// recorded length excludes the `\n` separator appended after the record.
    fn store_content(&mut self, content: &str) -> Result<()> {
        let cleaned: Vec<u8> = content
            .bytes()
            .map(|b| match b {
                b'\t' | b'\n' | b'\r' => b' ',
                other => other,
            })
            .collect();

        self.offsets.write_all(&self.content_pos.to_le_bytes())?;
        self.offsets
            .write_all(&(cleaned.len() as u32).to_le_bytes())?;

        self.content.write_all(&cleaned)?;
        self.content.write_all(b"\n")?;
        self.content_pos += cleaned.len() as u64 + 1;
        Ok(())
    }

    fn rotate_partition(&mut self) -> Result<()> {
        self.partition.flush()?;
        self.partition_index += 1;
        self.partition_bytes = 0;
        self.partition = BufWriter::new(File::create(partition_path(
            &self.out_dir,
            self.partition_index,
        ))?);
        info!(partition = self.partition_index, "opened postings partition");
        Ok(())
    }
}

/// Path of the k-th flat-postings partition file
pub fn partition_path(out_dir: &Path, index: u32) -> PathBuf {
    out_dir.join(format!("postings_part_{}.tsv", index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn read_postings(dir: &Path, partitions: u32) -> Vec<(String, u32, u32)> {
        let mut rows = Vec::new();
        for k in 0..partitions {
            let text = fs::read_to_string(partition_path(dir, k)).unwrap();
            for line in text.lines() {
                let mut fields = line.split('\t');
                rows.push((
                    fields.next().unwrap().to_string(),
                    fields.next().unwrap().parse().unwrap(),
                    fields.next().unwrap().parse().unwrap(),
                ));
            }
        }
        rows
    }

    #[test]
    fn test_build_small_collection() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("phase1");
        let input = dir.path().join("collection.tsv");
        fs::write(&input, "d100\tcat dog cat\nd101\tdog bird\nno tab here\n").unwrap();

        let builder = IndexBuilder::create(&out, IndexerConfig::default()).unwrap();
        let summary = builder.build_from_tsv(&input).unwrap();

        assert_eq!(summary.documents, 2);
        assert_eq!(summary.skipped_lines, 1);
        assert_eq!(summary.partitions, 1);
        // d100 has two distinct terms, d101 has two
        assert_eq!(summary.postings, 4);

        let table = fs::read_to_string(out.join(files::DOC_TABLE)).unwrap();
        assert_eq!(table, "0\td100\n1\td101\n");

        let rows = read_postings(&out, summary.partitions);
        let expected: HashSet<(String, u32, u32)> = [
            ("cat".to_string(), 0, 2),
            ("dog".to_string(), 0, 1),
            ("dog".to_string(), 1, 1),
            ("bird".to_string(), 1, 1),
        ]
        .into_iter()
        .collect();
        assert_eq!(rows.into_iter().collect::<HashSet<_>>(), expected);
    }

    #[test]
    fn test_content_cleaning_and_offsets() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("phase1");
        let mut builder = IndexBuilder::create(&out, IndexerConfig::default()).unwrap();
        builder.add_document("a", "line\rwith\tcontrol bytes").unwrap();
        builder.add_document("b", "plain").unwrap();
        builder.finish().unwrap();

        let content = fs::read(out.join(files::DOC_CONTENT)).unwrap();
        assert_eq!(content, b"line with control bytes\nplain\n");

        let offsets = fs::read(out.join(files::DOC_OFFSET)).unwrap();
        assert_eq!(offsets.len(), 24);
        let first_len = u32::from_le_bytes(offsets[8..12].try_into().unwrap());
        assert_eq!(first_len as usize, "line with control bytes".len());
        let second_off = u64::from_le_bytes(offsets[12..20].try_into().unwrap());
        assert_eq!(second_off as usize, "line with control bytes".len() + 1);
    }

    #[test]
    fn test_partition_rotation() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("phase1");
        let config = IndexerConfig {
            // Tiny budget: the second document overflows the first partition
            partition_budget_bytes: 25,
            ..Default::default()
        };
        let mut builder = IndexBuilder::create(&out, config).unwrap();
        builder.add_document("a", "alpha beta").unwrap();
        builder.add_document("b", "gamma delta").unwrap();
        builder.add_document("c", "epsilon").unwrap();
        let summary = builder.finish().unwrap();

        assert_eq!(summary.partitions, 2);
        let rows = read_postings(&out, summary.partitions);
        assert_eq!(rows.len(), 5);
        // The third document's posting landed in the fresh partition
        let last = fs::read_to_string(partition_path(&out, 1)).unwrap();
        assert_eq!(last, "epsilon\t2\t1\n");
    }
}
