//! Corpus chunking: documents are split with the recursive character splitter.

pub mod recursive;

use crate::corpus::CorpusDocument;
use crate::models::CorpusChunk;

/// Split a corpus document into indexable chunks.
pub fn chunk_document(doc: &CorpusDocument, chunk_size: usize, overlap: usize) -> Vec<CorpusChunk> {
    if doc.text.trim().is_empty() {
        return Vec::new();
    }

    recursive::split_text(&doc.text, chunk_size, overlap)
        .into_iter()
        .enumerate()
        .map(|(i, content)| CorpusChunk {
            chunk_id: format!("{}_chunk{i}", doc.file_name),
            source: doc.file_name.clone(),
            country: doc.metadata.country.clone(),
            visa_type: doc.metadata.visa_type.clone(),
            chunk_index: i,
            content,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::FileMetadata;

    fn doc(text: &str) -> CorpusDocument {
        CorpusDocument {
            file_name: "Canada_Canada_Study_Eligibility.txt".to_string(),
            metadata: FileMetadata {
                country: Some("Canada".into()),
                visa_type: Some("Study".into()),
            },
            text: text.to_string(),
        }
    }

    #[test]
    fn test_chunk_empty_document() {
        assert!(chunk_document(&doc("  "), 1000, 150).is_empty());
    }

    #[test]
    fn test_chunk_ids_and_metadata() {
        let text = (0..400).map(|i| format!("rule{i}")).collect::<Vec<_>>().join(" ");
        let chunks = chunk_document(&doc(&text), 200, 30);
        assert!(chunks.len() > 1);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i);
            assert_eq!(c.chunk_id, format!("Canada_Canada_Study_Eligibility.txt_chunk{i}"));
            assert_eq!(c.country.as_deref(), Some("Canada"));
            assert_eq!(c.visa_type.as_deref(), Some("Study"));
        }
    }
}
