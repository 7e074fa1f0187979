use anyhow::{Context, Result};
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::*;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy};

use crate::models::CorpusChunk;

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// BM25 search index over corpus chunks, built on tantivy.
pub struct Bm25Index {
    index: Index,
    reader: IndexReader,
    f_chunk_id: Field,
    f_source: Field,
    f_country: Field,
    f_visa_type: Field,
    f_chunk_index: Field,
    f_content: Field,
    /// Tokenized country + visa type, searchable but not stored
    f_title: Field,
}

#[derive(Debug, Clone)]
pub struct Bm25Hit {
    pub chunk: CorpusChunk,
    pub score: f32,
}

impl Bm25Index {
    /// Create or open a BM25 index at the given directory.
    pub fn open_or_create(index_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(index_dir)?;

        let mut schema_builder = Schema::builder();
        let f_chunk_id = schema_builder.add_text_field("chunk_id", STRING | STORED);
        let f_source = schema_builder.add_text_field("source", STRING | STORED);
        let f_country = schema_builder.add_text_field("country", STRING | STORED);
        let f_visa_type = schema_builder.add_text_field("visa_type", STRING | STORED);
        let f_chunk_index =
            schema_builder.add_u64_field("chunk_index", NumericOptions::default() | STORED);
        let f_content = schema_builder.add_text_field("content", TEXT | STORED);
        let f_title = schema_builder.add_text_field("title", TEXT);

        let schema = schema_builder.build();

        let index = if index_dir.join("meta.json").exists() {
            Index::open_in_dir(index_dir).context("Failed to open existing tantivy index")?
        } else {
            Index::create_in_dir(index_dir, schema).context("Failed to create tantivy index")?
        };

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .context("Failed to create reader")?;

        Ok(Self {
            index,
            reader,
            f_chunk_id,
            f_source,
            f_country,
            f_visa_type,
            f_chunk_index,
            f_content,
            f_title,
        })
    }

    /// Drop every indexed chunk and index `chunks` in their place.
    pub fn replace_all(&self, chunks: &[CorpusChunk]) -> Result<()> {
        let mut writer: IndexWriter = self
            .index
            .writer(WRITER_HEAP_BYTES)
            .context("Failed to create index writer")?;

        writer
            .delete_all_documents()
            .context("Failed to clear index")?;

        for chunk in chunks {
            let mut doc = TantivyDocument::default();
            doc.add_text(self.f_chunk_id, &chunk.chunk_id);
            doc.add_text(self.f_source, &chunk.source);
            if let Some(country) = &chunk.country {
                doc.add_text(self.f_country, country);
            }
            if let Some(visa_type) = &chunk.visa_type {
                doc.add_text(self.f_visa_type, visa_type);
            }
            doc.add_u64(self.f_chunk_index, chunk.chunk_index as u64);
            doc.add_text(self.f_content, &chunk.content);
            doc.add_text(
                self.f_title,
                format!(
                    "{} {}",
                    chunk.country.as_deref().unwrap_or_default(),
                    chunk.visa_type.as_deref().unwrap_or_default()
                ),
            );
            writer.add_document(doc)?;
        }

        writer.commit().context("Failed to commit index")?;
        self.reader.reload().context("Failed to reload reader")?;
        Ok(())
    }

    pub fn doc_count(&self) -> usize {
        self.reader.searcher().num_docs() as usize
    }

    /// Search the index and return scored hits, best first.
    pub fn search(&self, query_str: &str, limit: usize) -> Result<Vec<Bm25Hit>> {
        let cleaned = sanitize_query(query_str);
        if cleaned.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();

        let query_parser = QueryParser::for_index(&self.index, vec![self.f_content, self.f_title]);
        let query = query_parser
            .parse_query(&cleaned)
            .context("Failed to parse search query")?;

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit))
            .context("Search failed")?;

        let mut hits = Vec::with_capacity(top_docs.len());

        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(doc_address)
                .context("Failed to retrieve document")?;

            let text = |field: Field| {
                doc.get_first(field)
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            };

            hits.push(Bm25Hit {
                chunk: CorpusChunk {
                    chunk_id: text(self.f_chunk_id).unwrap_or_default(),
                    source: text(self.f_source).unwrap_or_default(),
                    country: text(self.f_country),
                    visa_type: text(self.f_visa_type),
                    chunk_index: doc
                        .get_first(self.f_chunk_index)
                        .and_then(|v| v.as_u64())
                        .unwrap_or(0) as usize,
                    content: text(self.f_content).unwrap_or_default(),
                },
                score,
            });
        }

        Ok(hits)
    }
}

/// Reduce free text to plain terms so tantivy's query syntax (`:`, `"`,
/// `+`, brackets, ...) in user input never produces a parse error.
fn sanitize_query(query: &str) -> String {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !matches!(t.as_str(), "and" | "or" | "not"))
        .collect::<Vec<_>>()
        .join(" ")
}
