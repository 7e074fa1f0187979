//! The on-disk corpus: a flat directory of cleaned `.txt` policy files.
//!
//! Country and visa type come from the file name
//! (`<Country>_<Country>_<VisaType>_<suffix>.txt`: first segment is the
//! country, third the visa type). An optional `index.json` sidecar in the
//! same directory maps file names to explicit metadata and wins over the
//! positional parse for the files it lists.

pub mod clean;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

pub const SIDECAR_FILE: &str = "index.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub country: Option<String>,
    pub visa_type: Option<String>,
}

/// A corpus file with its text loaded.
#[derive(Debug, Clone)]
pub struct CorpusDocument {
    pub file_name: String,
    pub metadata: FileMetadata,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub file_name: String,
    pub metadata: FileMetadata,
}

#[derive(Debug, Clone, Default)]
pub struct CatalogStats {
    pub documents: usize,
    pub countries: Vec<String>,
    pub visa_types: Vec<String>,
}

/// Positional metadata for a corpus file name. `None` for non-`.txt` files.
pub fn parse_file_name(file_name: &str) -> Option<FileMetadata> {
    let stem = file_name.strip_suffix(".txt")?;
    let parts: Vec<&str> = stem.split('_').collect();

    let segment = |i: usize, min_parts: usize| {
        (parts.len() >= min_parts)
            .then(|| parts[i])
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Some(FileMetadata {
        country: segment(0, 2),
        visa_type: segment(2, 3),
    })
}

/// Read-only view over the corpus directory.
#[derive(Debug, Clone)]
pub struct CorpusCatalog {
    dir: PathBuf,
}

impl CorpusCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    fn load_sidecar(&self) -> HashMap<String, FileMetadata> {
        let path = self.dir.join(SIDECAR_FILE);
        let Ok(data) = std::fs::read_to_string(&path) else {
            return HashMap::new();
        };
        match serde_json::from_str(&data) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!("Ignoring malformed sidecar {}: {e}", path.display());
                HashMap::new()
            }
        }
    }

    /// All `.txt` files in the corpus directory, sorted by name.
    /// A missing directory is an empty corpus.
    pub fn entries(&self) -> Vec<CatalogEntry> {
        if !self.exists() {
            return Vec::new();
        }
        let sidecar = self.load_sidecar();

        walkdir::WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let file_name = e.file_name().to_string_lossy().to_string();
                let parsed = parse_file_name(&file_name)?;
                let metadata = sidecar.get(&file_name).cloned().unwrap_or(parsed);
                Some(CatalogEntry { file_name, metadata })
            })
            .collect()
    }

    pub fn countries(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|e| e.metadata.country)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn visa_types(&self, country: &str) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.metadata.country.as_deref() == Some(country))
            .filter_map(|e| e.metadata.visa_type)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn stats(&self) -> CatalogStats {
        let entries = self.entries();
        let mut countries = BTreeSet::new();
        let mut visa_types = BTreeSet::new();
        for e in &entries {
            if let Some(c) = &e.metadata.country {
                countries.insert(c.clone());
            }
            if let Some(v) = &e.metadata.visa_type {
                visa_types.insert(v.clone());
            }
        }
        CatalogStats {
            documents: entries.len(),
            countries: countries.into_iter().collect(),
            visa_types: visa_types.into_iter().collect(),
        }
    }

    /// Load every corpus file's text.
    pub fn load_documents(&self) -> Result<Vec<CorpusDocument>> {
        self.entries()
            .into_iter()
            .map(|entry| {
                let path = self.dir.join(&entry.file_name);
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Ok(CorpusDocument {
                    file_name: entry.file_name,
                    metadata: entry.metadata,
                    text,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_parse_full_name() {
        let meta = parse_file_name("Canada_Canada_StudyPermit_Eligibility.txt").unwrap();
        assert_eq!(meta.country.as_deref(), Some("Canada"));
        assert_eq!(meta.visa_type.as_deref(), Some("StudyPermit"));
    }

    #[test]
    fn test_parse_short_names() {
        let two = parse_file_name("Japan_Overview.txt").unwrap();
        assert_eq!(two.country.as_deref(), Some("Japan"));
        assert_eq!(two.visa_type, None);

        let one = parse_file_name("README.txt").unwrap();
        assert_eq!(one, FileMetadata::default());
    }

    #[test]
    fn test_parse_three_segments_without_suffix() {
        let meta = parse_file_name("UK_UK_Tourist.txt").unwrap();
        assert_eq!(meta.visa_type.as_deref(), Some("Tourist"));
    }

    #[test]
    fn test_parse_non_txt() {
        assert!(parse_file_name("Canada_Canada_Study_Eligibility.pdf").is_none());
        assert!(parse_file_name("index.json").is_none());
    }

    #[test]
    fn test_catalog_listing() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Canada_Canada_Study_Eligibility.txt", "x");
        write(dir.path(), "Canada_Canada_Work_Eligibility.txt", "x");
        write(dir.path(), "Australia_Australia_Tourist_Eligibility.txt", "x");
        write(dir.path(), "notes.md", "ignored");

        let catalog = CorpusCatalog::new(dir.path());
        assert_eq!(catalog.countries(), vec!["Australia", "Canada"]);
        assert_eq!(catalog.visa_types("Canada"), vec!["Study", "Work"]);
        assert!(catalog.visa_types("Narnia").is_empty());

        let stats = catalog.stats();
        assert_eq!(stats.documents, 3);
        assert_eq!(stats.visa_types.len(), 3);
    }

    #[test]
    fn test_catalog_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = CorpusCatalog::new(dir.path().join("absent"));
        assert!(catalog.countries().is_empty());
        assert_eq!(catalog.stats().documents, 0);
        assert!(catalog.load_documents().unwrap().is_empty());
    }

    #[test]
    fn test_sidecar_overrides_positional_parse() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "schengen-short-stay.txt", "x");
        write(dir.path(), "Canada_Canada_Study_Eligibility.txt", "x");
        write(
            dir.path(),
            SIDECAR_FILE,
            r#"{"schengen-short-stay.txt": {"country": "France", "visa_type": "Schengen"}}"#,
        );

        let catalog = CorpusCatalog::new(dir.path());
        assert_eq!(catalog.countries(), vec!["Canada", "France"]);
        assert_eq!(catalog.visa_types("France"), vec!["Schengen"]);
    }

    #[test]
    fn test_malformed_sidecar_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Canada_Canada_Study_Eligibility.txt", "x");
        write(dir.path(), SIDECAR_FILE, "{not json");
        assert_eq!(CorpusCatalog::new(dir.path()).countries(), vec!["Canada"]);
    }

    #[test]
    fn test_load_documents_reads_text() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Canada_Canada_Study_Eligibility.txt", "Proof of funds");
        let docs = CorpusCatalog::new(dir.path()).load_documents().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "Proof of funds");
        assert_eq!(docs[0].metadata.visa_type.as_deref(), Some("Study"));
    }
}
