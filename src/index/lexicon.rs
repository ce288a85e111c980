use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;

/// Lexicon entry: everything needed to open one term's posting list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TermMeta {
    /// Document frequency (number of postings)
    pub df: u32,
    /// Collection frequency (sum of term frequencies)
    pub cf: u64,
    /// Byte offset of the first block in postings.docids.bin
    pub docids_offset: u64,
    /// Byte offset of the first block in postings.freqs.bin
    pub freqs_offset: u64,
    /// Number of blocks in the posting list
    pub blocks: u32,
}

/// Term dictionary loaded from `lexicon.tsv`
#[derive(Debug, Default)]
pub struct Lexicon {
    terms: HashMap<String, TermMeta>,
}

impl Lexicon {
    /// Load the lexicon from its tab-separated on-disk form
    ///
    /// Lines starting with `#` are comments. Lines that fail to parse are
    /// logged and skipped; parsing continues with the next line.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut terms = HashMap::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_line(&line) {
                Some((term, meta)) => {
                    terms.insert(term, meta);
                }
                None => {
                    warn!(
                        line = line_no + 1,
                        "skipping malformed lexicon line: {:?}", line
                    );
                }
            }
        }

        info!(terms = terms.len(), path = %path.display(), "loaded lexicon");
        Ok(Self { terms })
    }

    pub fn get(&self, term: &str) -> Option<&TermMeta> {
        self.terms.get(term)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterate over all (term, meta) entries in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TermMeta)> {
        self.terms.iter().map(|(t, m)| (t.as_str(), m))
    }
}

fn parse_line(line: &str) -> Option<(String, TermMeta)> {
    let mut fields = line.split('\t');
    let term = fields.next()?;
    let meta = TermMeta {
        df: fields.next()?.parse().ok()?,
        cf: fields.next()?.parse().ok()?,
        docids_offset: fields.next()?.parse().ok()?,
        freqs_offset: fields.next()?.parse().ok()?,
        blocks: fields.next()?.parse().ok()?,
    };
    if term.is_empty() || fields.next().is_some() {
        return None;
    }
    Some((term.to_string(), meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_line() {
        let (term, meta) = parse_line("cat\t3\t7\t0\t12\t1").unwrap();
        assert_eq!(term, "cat");
        assert_eq!(
            meta,
            TermMeta {
                df: 3,
                cf: 7,
                docids_offset: 0,
                freqs_offset: 12,
                blocks: 1,
            }
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_line("cat\t3\t7").is_none());
        assert!(parse_line("cat\tx\t7\t0\t12\t1").is_none());
        assert!(parse_line("cat\t3\t7\t0\t12\t1\textra").is_none());
        assert!(parse_line("").is_none());
    }

    #[test]
    fn test_load_skips_header_and_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.tsv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "# term\tdf\tcf\tdocids_offset\tfreqs_offset\tblocks").unwrap();
        writeln!(file, "cat\t2\t5\t0\t0\t1").unwrap();
        writeln!(file, "broken line").unwrap();
        writeln!(file, "dog\t1\t1\t9\t4\t1").unwrap();
        drop(file);

        let lexicon = Lexicon::load(&path).unwrap();
        assert_eq!(lexicon.len(), 2);
        assert_eq!(lexicon.get("cat").unwrap().df, 2);
        assert_eq!(lexicon.get("dog").unwrap().docids_offset, 9);
        assert!(lexicon.get("broken").is_none());
    }
}
