use std::collections::HashMap;

use crate::models::CorpusChunk;
use crate::search::bm25::Bm25Hit;
use crate::search::vector::VectorHit;

/// RRF constant
const RRF_K: f32 = 60.0;
/// Bonus for chunks ranked first by either retriever
const TOP_RANK_BONUS: f32 = 0.05;

#[derive(Debug, Clone)]
pub struct FusedHit {
    pub chunk: CorpusChunk,
    pub bm25_score: f32,
    pub vector_score: f32,
    pub combined_score: f32,
}

/// Reciprocal Rank Fusion of the BM25 and vector result lists.
///
/// Each list contributes `1 / (k + rank)`; chunks in rank 1 of either list
/// get a small bonus. With one list empty this preserves the other's order.
pub fn rrf_fusion(bm25_hits: &[Bm25Hit], vector_hits: &[VectorHit], limit: usize) -> Vec<FusedHit> {
    let mut score_map: HashMap<String, FusedHit> = HashMap::new();

    let lists = bm25_hits
        .iter()
        .enumerate()
        .map(|(rank, h)| (rank, &h.chunk, h.score, true))
        .chain(
            vector_hits
                .iter()
                .enumerate()
                .map(|(rank, h)| (rank, &h.chunk, h.score, false)),
        );

    for (rank, chunk, score, is_bm25) in lists {
        let entry = score_map
            .entry(chunk.chunk_id.clone())
            .or_insert_with(|| FusedHit {
                chunk: chunk.clone(),
                bm25_score: 0.0,
                vector_score: 0.0,
                combined_score: 0.0,
            });

        if is_bm25 {
            entry.bm25_score = entry.bm25_score.max(score);
        } else {
            entry.vector_score = entry.vector_score.max(score);
        }
        entry.combined_score += 1.0 / (RRF_K + rank as f32 + 1.0);
        if rank == 0 {
            entry.combined_score += TOP_RANK_BONUS;
        }
    }

    let mut results: Vec<FusedHit> = score_map.into_values().collect();
    results.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk.chunk_id.cmp(&b.chunk.chunk_id))
    });
    results.truncate(limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str) -> CorpusChunk {
        CorpusChunk {
            chunk_id: id.to_string(),
            source: format!("{id}.txt"),
            country: None,
            visa_type: None,
            chunk_index: 0,
            content: format!("content of {id}"),
        }
    }

    fn bm25(id: &str, score: f32) -> Bm25Hit {
        Bm25Hit {
            chunk: chunk(id),
            score,
        }
    }

    fn vector(id: &str, score: f32) -> VectorHit {
        VectorHit {
            chunk: chunk(id),
            score,
        }
    }

    #[test]
    fn test_rrf_empty() {
        assert!(rrf_fusion(&[], &[], 10).is_empty());
    }

    #[test]
    fn test_rrf_single_list_keeps_order() {
        let hits = vec![bm25("a", 9.0), bm25("b", 5.0), bm25("c", 1.0)];
        let fused = rrf_fusion(&hits, &[], 10);
        let ids: Vec<&str> = fused.iter().map(|h| h.chunk.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(fused[0].bm25_score, 9.0);
        assert_eq!(fused[0].vector_score, 0.0);
    }

    #[test]
    fn test_rrf_agreement_wins() {
        // "b" is second in both lists, "a" and "c" each top one list
        let fused = rrf_fusion(
            &[bm25("a", 3.0), bm25("b", 2.0)],
            &[vector("c", 0.9), vector("b", 0.8)],
            10,
        );
        assert_eq!(fused.len(), 3);
        let b = fused.iter().find(|h| h.chunk.chunk_id == "b").unwrap();
        assert!(b.bm25_score > 0.0 && b.vector_score > 0.0);
        // rank 1 + bonus (0.066) outscores two rank-2 hits (0.032)
        assert_ne!(fused[0].chunk.chunk_id, "b");
    }

    #[test]
    fn test_rrf_respects_limit() {
        let hits: Vec<Bm25Hit> = (0..10).map(|i| bm25(&format!("c{i}"), 1.0)).collect();
        assert_eq!(rrf_fusion(&hits, &[], 3).len(), 3);
    }
}
