//! Newline-delimited list loading and chunking

use crate::error::{ReconError, Result};
use std::path::Path;
use tokio::fs;

/// Load a newline-delimited list, trimming whitespace and skipping blank lines
pub async fn load_wordlist(path: &Path) -> Result<Vec<String>> {
    let content = fs::read(path)
        .await
        .map_err(|e| ReconError::read(path, e))?;

    Ok(parse_lines(&String::from_utf8_lossy(&content)))
}

/// Split list content into trimmed, non-empty lines
pub fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Split a wordlist into at most `chunks` contiguous slices of near-equal size.
///
/// Every word lands in exactly one chunk and the original order is kept. An empty
/// wordlist yields no chunks.
pub fn split_into_chunks(words: &[String], chunks: usize) -> Vec<Vec<String>> {
    if words.is_empty() {
        return Vec::new();
    }

    let chunk_size = words.len().div_ceil(chunks.max(1));
    words.chunks(chunk_size).map(<[String]>::to_vec).collect()
}
