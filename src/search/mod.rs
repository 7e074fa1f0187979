//! The corpus index: BM25 keyword search plus optional embedding search,
//! fused with RRF. This is the concrete [`DocumentStore`].

pub mod bm25;
pub mod hybrid;
pub mod vector;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::EmbeddingConfig;
use crate::error::RetrievalError;
use crate::llm::embeddings;
use crate::models::{CorpusChunk, RetrievedPassage};
use crate::traits::DocumentStore;

use bm25::Bm25Index;
use hybrid::rrf_fusion;
use vector::VectorStore;

/// Each retriever fetches this many candidates per requested passage.
const FETCH_MULTIPLIER: usize = 3;

pub struct CorpusIndex {
    bm25: Arc<Bm25Index>,
    vectors: VectorStore,
    http_client: reqwest::Client,
    embedding: EmbeddingConfig,
}

impl CorpusIndex {
    /// Open (or create) the BM25 index under `dir/bm25` and vectors under `dir/vectors`.
    pub fn open_or_create(
        dir: &Path,
        embedding: EmbeddingConfig,
        http_client: reqwest::Client,
    ) -> Result<Self> {
        let bm25 = Bm25Index::open_or_create(&dir.join("bm25"))?;
        let vectors = VectorStore::open_or_create(&dir.join("vectors"))?;
        Ok(Self {
            bm25: Arc::new(bm25),
            vectors,
            http_client,
            embedding,
        })
    }

    /// Replace the whole index. Without embeddings the vector half is cleared
    /// and retrieval runs on BM25 alone. Blocking.
    pub fn rebuild(&self, chunks: &[CorpusChunk], embeddings: Option<Vec<Vec<f32>>>) -> Result<()> {
        self.bm25.replace_all(chunks)?;
        match embeddings {
            Some(embeddings) => self.vectors.replace_all(chunks, embeddings)?,
            None => self.vectors.clear()?,
        }
        Ok(())
    }

    pub fn chunk_count(&self) -> usize {
        self.bm25.doc_count()
    }

    pub fn embedded_count(&self) -> usize {
        self.vectors.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.chunk_count() == 0
    }

    pub fn embedding_config(&self) -> &EmbeddingConfig {
        &self.embedding
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }
}

#[async_trait]
impl DocumentStore for CorpusIndex {
    async fn retrieve(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let fetch_limit = k * FETCH_MULTIPLIER;

        let bm25 = self.bm25.clone();
        let q = query.to_string();
        let bm25_hits = tokio::task::spawn_blocking(move || bm25.search(&q, fetch_limit)).await??;

        let vector_hits = if self.embedding.is_enabled() && self.vectors.entry_count() > 0 {
            match embeddings::embed_single(&self.http_client, &self.embedding, query).await {
                Ok(query_embedding) => self.vectors.search(&query_embedding, fetch_limit),
                Err(e) => {
                    tracing::warn!("Vector search skipped: {e:#}");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        tracing::debug!(
            bm25 = bm25_hits.len(),
            vector = vector_hits.len(),
            k,
            "corpus retrieval"
        );

        Ok(rrf_fusion(&bm25_hits, &vector_hits, k)
            .into_iter()
            .map(|hit| hit.chunk.into_passage(hit.combined_score))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(source: &str, i: usize, content: &str) -> CorpusChunk {
        CorpusChunk {
            chunk_id: format!("{source}_chunk{i}"),
            source: source.to_string(),
            country: Some("Canada".into()),
            visa_type: Some("Study".into()),
            chunk_index: i,
            content: content.to_string(),
        }
    }

    fn bm25_only_index(dir: &Path) -> CorpusIndex {
        let embedding = EmbeddingConfig {
            provider: "none".into(),
            ..EmbeddingConfig::default()
        };
        CorpusIndex::open_or_create(dir, embedding, reqwest::Client::new()).unwrap()
    }

    #[tokio::test]
    async fn test_retrieve_returns_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let index = bm25_only_index(dir.path());
        index
            .rebuild(
                &[
                    chunk("Canada_Canada_Study_Eligibility.txt", 0, "Proof of funds is required for a study permit."),
                    chunk("Canada_Canada_Study_Eligibility.txt", 1, "Biometrics appointment details."),
                ],
                None,
            )
            .unwrap();

        let passages = index.retrieve("proof of funds", 1).await.unwrap();
        assert_eq!(passages.len(), 1);
        assert!(passages[0].content.contains("Proof of funds"));
        assert_eq!(
            passages[0].metadata["source"],
            "Canada_Canada_Study_Eligibility.txt"
        );
        assert_eq!(passages[0].metadata["chunk_index"], 0);
        assert_eq!(passages[0].metadata["country"], "Canada");
    }

    #[tokio::test]
    async fn test_retrieve_zero_k_or_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let index = bm25_only_index(dir.path());
        assert!(index.is_empty());
        assert!(index.retrieve("anything", 3).await.unwrap().is_empty());
        assert!(index.retrieve("anything", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rebuild_without_embeddings_clears_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let index = bm25_only_index(dir.path());
        let chunks = vec![chunk("a.txt", 0, "alpha")];
        index.rebuild(&chunks, Some(vec![vec![1.0, 0.0]])).unwrap();
        assert_eq!(index.embedded_count(), 1);
        index.rebuild(&chunks, None).unwrap();
        assert_eq!(index.embedded_count(), 0);
        assert_eq!(index.chunk_count(), 1);
    }
}
