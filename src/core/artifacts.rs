//! Combine and deduplicate newline-delimited artifacts

use crate::core::wordlist::parse_lines;
use crate::error::{ReconError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Remove duplicates, keeping the first occurrence of each line in place
pub fn dedup(lines: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(lines.len());
    lines
        .into_iter()
        .filter(|line| seen.insert(line.clone()))
        .collect()
}

/// Concatenate `inputs` in order into `output`, returning the combined bytes.
///
/// A newline is inserted after any input that does not end with one so the last line of
/// one file never fuses with the first line of the next.
pub async fn combine_files(inputs: &[PathBuf], output: &Path) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    for input in inputs {
        let content = fs::read(input)
            .await
            .map_err(|e| ReconError::read(input, e))?;
        buf.extend_from_slice(&content);
        if !content.is_empty() && !content.ends_with(b"\n") {
            buf.push(b'\n');
        }
    }

    fs::write(output, &buf)
        .await
        .map_err(|e| ReconError::write(output, e))?;
    Ok(buf)
}

/// Combine `inputs` into `combined`, then write the deduplicated lines to `unique`
pub async fn combine_and_dedup(
    inputs: &[PathBuf],
    combined: &Path,
    unique: &Path,
) -> Result<Vec<String>> {
    let buf = combine_files(inputs, combined).await?;
    let lines = dedup(parse_lines(&String::from_utf8_lossy(&buf)));
    write_lines(unique, &lines).await?;
    Ok(lines)
}

/// Write one entry per line, truncating any existing file
pub async fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut content = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    fs::write(path, content)
        .await
        .map_err(|e| ReconError::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let lines = strings(&["b", "a", "b", "c", "a"]);
        assert_eq!(dedup(lines), strings(&["b", "a", "c"]));
    }

    #[test]
    fn dedup_is_idempotent() {
        let once = dedup(strings(&["x", "y", "x", "z", "y", "x"]));
        assert_eq!(dedup(once.clone()), once);
    }

    #[tokio::test]
    async fn combine_content_is_order_independent() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.out");
        let b = dir.path().join("b.out");
        fs::write(&a, "1.a.com\n2.a.com\nshared.com\n").await.unwrap();
        // No trailing newline on purpose
        fs::write(&b, "shared.com\n1.b.com").await.unwrap();

        let ab = combine_and_dedup(
            &[a.clone(), b.clone()],
            &dir.path().join("ab.txt"),
            &dir.path().join("ab_unique.txt"),
        )
        .await
        .unwrap();
        let ba = combine_and_dedup(
            &[b, a],
            &dir.path().join("ba.txt"),
            &dir.path().join("ba_unique.txt"),
        )
        .await
        .unwrap();

        let ab_set: HashSet<_> = ab.iter().collect();
        let ba_set: HashSet<_> = ba.iter().collect();
        assert_eq!(ab_set, ba_set);
        assert_eq!(ab.len(), 4);

        let combined = fs::read_to_string(dir.path().join("ba.txt")).await.unwrap();
        assert_eq!(combined, "shared.com\n1.b.com\n1.a.com\n2.a.com\nshared.com\n");
        let unique = fs::read_to_string(dir.path().join("ab_unique.txt")).await.unwrap();
        assert_eq!(unique, "1.a.com\n2.a.com\nshared.com\n1.b.com\n");
    }

    #[tokio::test]
    async fn combine_missing_input_fails() {
        let dir = TempDir::new().unwrap();
        let err = combine_files(&[dir.path().join("missing.out")], &dir.path().join("out.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconError::Read { .. }));
    }
}
