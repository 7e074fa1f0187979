use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));
static NON_ASCII_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\x00-\x7F]+").expect("static regex"));

/// Normalize scraped policy text: collapse whitespace runs to one space,
/// drop non-ASCII characters, trim.
pub fn clean_text(text: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(text, " ");
    let ascii = NON_ASCII_RUN.replace_all(&collapsed, "");
    ascii.trim().to_string()
}

/// Clean every `.txt` file in `raw_dir` into `clean_dir` under the same name.
/// Returns the number of files written.
pub fn clean_directory(raw_dir: &Path, clean_dir: &Path) -> Result<usize> {
    if !raw_dir.is_dir() {
        tracing::warn!("Raw corpus directory {} not found, nothing to clean", raw_dir.display());
        return Ok(0);
    }
    std::fs::create_dir_all(clean_dir)
        .with_context(|| format!("Failed to create {}", clean_dir.display()))?;

    let mut written = 0;
    for entry in walkdir::WalkDir::new(raw_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "txt") {
            continue;
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let target = clean_dir.join(entry.file_name());
        std::fs::write(&target, clean_text(&raw))
            .with_context(|| format!("Failed to write {}", target.display()))?;
        written += 1;
    }

    tracing::info!("Cleaned {written} files into {}", clean_dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_collapses_whitespace() {
        assert_eq!(clean_text("  Study\n\n permit\t rules  "), "Study permit rules");
    }

    #[test]
    fn test_clean_drops_non_ascii() {
        assert_eq!(clean_text("Fee: €150 — payable"), "Fee: 150  payable");
    }

    #[test]
    fn test_clean_empty() {
        assert_eq!(clean_text(" \n\t "), "");
    }

    #[test]
    fn test_clean_directory_only_txt() {
        let raw = tempfile::tempdir().unwrap();
        let clean = tempfile::tempdir().unwrap();
        std::fs::write(raw.path().join("Canada_Canada_Study_Eligibility.txt"), "a\n\nb").unwrap();
        std::fs::write(raw.path().join("notes.md"), "skip me").unwrap();

        let n = clean_directory(raw.path(), clean.path()).unwrap();
        assert_eq!(n, 1);
        let out =
            std::fs::read_to_string(clean.path().join("Canada_Canada_Study_Eligibility.txt")).unwrap();
        assert_eq!(out, "a b");
        assert!(!clean.path().join("notes.md").exists());
    }

    #[test]
    fn test_clean_directory_missing_raw_dir() {
        let clean = tempfile::tempdir().unwrap();
        let n = clean_directory(&clean.path().join("nope"), clean.path()).unwrap();
        assert_eq!(n, 0);
    }
}
