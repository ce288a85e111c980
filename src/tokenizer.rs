//! Byte-wise ASCII tokenizer shared by the indexer and the query path
//!
//! ASCII-alphanumeric bytes are case-folded and accumulated; every other byte
//! (including all non-ASCII bytes) terminates the current token. The indexer
//! and the querier must see identical token sequences for identical input, so
//! this is the only tokenization rule in the crate.

use std::collections::HashMap;

/// Split text into lowercase alphanumeric tokens
pub fn tokenize(text: &str) -> Vec<String> {
    tokenize_bytes(text.as_bytes())
}

/// Tokenize raw content bytes
pub fn tokenize_bytes(bytes: &[u8]) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for &b in bytes {
        if b.is_ascii_alphanumeric() {
            current.push(b.to_ascii_lowercase() as char);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Tally term frequencies for one document
pub fn term_frequencies(text: &str) -> HashMap<String, u32> {
    let mut freq = HashMap::new();
    for token in tokenize(text) {
        *freq.entry(token).or_insert(0) += 1;
    }
    freq
}
