//! Query-dependent snippet extraction
//!
//! Finds the earliest whole-word occurrence of any query term in the stored
//! content bytes and cuts a window of roughly 200 bytes around it, snapped to
//! sentence or word boundaries. Without a match the excerpt is simply the
//! head of the document. Ellipses mark truncation on either side.

/// Maximum excerpt length in bytes
const SNIPPET_LENGTH: usize = 200;
/// Leading context kept before the first matched term
const CONTEXT_WINDOW: usize = 50;
/// How far a boundary search may move an edge
const BOUNDARY_SCAN: usize = 100;

const SENTENCE_ENDS: &[u8] = b".!?\n";
const WORD_BREAKS: &[u8] = b" \t\n";

/// Build an excerpt of `content` centered on the first query term hit
pub fn generate(content: &[u8], query_terms: &[String]) -> String {
    if content.is_empty() || query_terms.is_empty() {
        return truncate(content, SNIPPET_LENGTH);
    }

    let best = query_terms
        .iter()
        .filter_map(|term| find_whole_word(content, term, 0))
        .min();
    let Some(pos) = best else {
        return truncate(content, SNIPPET_LENGTH);
    };

    let mut start = pos.saturating_sub(CONTEXT_WINDOW);
    let mut end = (start + SNIPPET_LENGTH).min(content.len());

    if start > 0 {
        if let Some(q) = rfind_any(&content[..=start], SENTENCE_ENDS) {
            if start - q < BOUNDARY_SCAN {
                start = q + 1;
                while start < content.len() && content[start].is_ascii_whitespace() {
                    start += 1;
                }
            } else {
                start = rewind_to_word(content, start);
            }
        } else {
            start = rewind_to_word(content, start);
        }
    }

    if end < content.len() {
        if let Some(q) = find_any(content, end, SENTENCE_ENDS) {
            if q - end < BOUNDARY_SCAN {
                end = q + 1;
            } else if let Some(q) = find_any(content, end, WORD_BREAKS) {
                end = q;
            }
        } else if let Some(q) = find_any(content, end, WORD_BREAKS) {
            end = q;
        }
    }

    let excerpt = trim_ascii(&content[start..end.max(start)]);
    let mut snippet = String::new();
    if start > 0 {
        snippet.push_str("...");
    }
    snippet.push_str(&String::from_utf8_lossy(excerpt));
    if end < content.len() {
        snippet.push_str("...");
    }
    snippet
}

/// Earliest whole-word, case-insensitive occurrence of `term` at or after `from`
///
/// A match requires the bytes on both sides to be non-alphanumeric or absent.
fn find_whole_word(content: &[u8], term: &str, from: usize) -> Option<usize> {
    let term = term.as_bytes();
    if term.is_empty() || content.len() < term.len() {
        return None;
    }
    for i in from..=content.len() - term.len() {
        if !content[i..i + term.len()].eq_ignore_ascii_case(term) {
            continue;
        }
        let start_ok = i == 0 || !content[i - 1].is_ascii_alphanumeric();
        let after = i + term.len();
        let end_ok = after == content.len() || !content[after].is_ascii_alphanumeric();
        if start_ok && end_ok {
            return Some(i);
        }
    }
    None
}

/// Head of the content, cut at a word boundary when one is close enough
fn truncate(content: &[u8], max_len: usize) -> String {
    if content.len() <= max_len {
        return String::from_utf8_lossy(trim_ascii(content)).into_owned();
    }
    let mut cut = max_len;
    if let Some(q) = rfind_any(&content[..=max_len], WORD_BREAKS) {
        if q > max_len * 4 / 5 {
            cut = q;
        }
    }
    let mut out = String::from_utf8_lossy(trim_ascii(&content[..cut])).into_owned();
    out.push_str("...");
    out
}

fn rewind_to_word(content: &[u8], start: usize) -> usize {
    match rfind_any(&content[..=start], WORD_BREAKS) {
        Some(q) if q > 0 => q + 1,
        _ => start,
    }
}

fn rfind_any(haystack: &[u8], set: &[u8]) -> Option<usize> {
    haystack.iter().rposition(|b| set.contains(b))
}

fn find_any(haystack: &[u8], from: usize, set: &[u8]) -> Option<usize> {
    haystack[from..]
        .iter()
        .position(|b| set.contains(b))
        .map(|p| from + p)
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map(|p| p + 1)
        .unwrap_or(start);
    &bytes[start..end]
}
