//! Corpus ingestion: clean raw text, chunk it, export the chunks and
//! (re)build the corpus index.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crate::chunking::chunk_document;
use crate::config::Config;
use crate::corpus::{clean, CorpusCatalog};
use crate::llm::embeddings;
use crate::models::CorpusChunk;
use crate::search::CorpusIndex;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Raw files cleaned into the corpus directory
    pub cleaned: usize,
    pub documents: usize,
    pub chunks: usize,
    /// Chunks that also got an embedding
    pub embedded: usize,
}

/// Run the whole pipeline. With `clean_raw`, `raw_dir` is cleaned into
/// `clean_dir` first; otherwise the corpus directory is used as is.
pub async fn run_ingest(config: &Config, index: Arc<CorpusIndex>, clean_raw: bool) -> Result<IngestReport> {
    let mut report = IngestReport::default();

    if clean_raw {
        let raw_dir = config.raw_dir.clone();
        let clean_dir = config.clean_dir.clone();
        report.cleaned =
            tokio::task::spawn_blocking(move || clean::clean_directory(&raw_dir, &clean_dir))
                .await??;
    }

    let catalog = CorpusCatalog::new(&config.clean_dir);
    let documents = catalog.load_documents()?;
    report.documents = documents.len();
    tracing::info!("Loaded {} documents from {}", documents.len(), config.clean_dir.display());

    let chunks: Vec<CorpusChunk> = documents
        .iter()
        .flat_map(|doc| chunk_document(doc, config.chunk_size, config.chunk_overlap))
        .collect();
    report.chunks = chunks.len();
    tracing::info!("Created {} chunks", chunks.len());

    export_chunks(&config.chunks_path(), &chunks)?;

    let embedded = if index.embedding_config().is_enabled() && !chunks.is_empty() {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        match embeddings::embed_batch(index.http_client(), index.embedding_config(), &texts).await {
            Ok(vectors) => {
                tracing::info!("Embedded {} chunks", vectors.len());
                Some(vectors)
            }
            Err(e) => {
                tracing::warn!("Embedding failed, index will be keyword-only: {e:#}");
                None
            }
        }
    } else {
        None
    };
    report.embedded = embedded.as_ref().map_or(0, Vec::len);

    let idx = index.clone();
    tokio::task::spawn_blocking(move || idx.rebuild(&chunks, embedded))
        .await
        .context("Index rebuild task failed")??;

    tracing::info!(
        documents = report.documents,
        chunks = report.chunks,
        embedded = report.embedded,
        "Corpus index rebuilt"
    );
    Ok(report)
}

/// Write chunks as JSON lines, one object per chunk.
pub fn export_chunks(path: &Path, chunks: &[CorpusChunk]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = std::io::BufWriter::new(file);
    for chunk in chunks {
        serde_json::to_writer(&mut out, chunk)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
