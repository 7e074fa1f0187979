use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;

use super::ApiError;
use crate::models::{Requirement, VectorStoreHit, VectorStoreQuery, VectorStoreResponse};
use crate::state::AppState;

/// Upper bound on `k` for direct store queries
pub const MAX_QUERY_K: usize = 50;
const PREVIEW_CHARS: usize = 500;
const REQUIREMENT_CHARS: usize = 800;
const REQUIREMENTS_K: usize = 3;

/// Cut `text` to `max` characters, marking the cut with "...".
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

fn prefix(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// POST /vectorstore/query - raw passages for a free-text query.
pub async fn query(
    State(state): State<AppState>,
    payload: Result<Json<VectorStoreQuery>, JsonRejection>,
) -> Result<Json<VectorStoreResponse>, ApiError> {
    let Json(req) = payload?;
    let query = req.query.trim().to_string();
    if query.is_empty() {
        return Err(ApiError::BadRequest("Query is required".to_string()));
    }
    let k = req.k.unwrap_or(state.config.top_k).min(MAX_QUERY_K);

    let passages = state.retrieve(&query, k).await?;
    let results: Vec<VectorStoreHit> = passages
        .into_iter()
        .enumerate()
        .map(|(i, p)| VectorStoreHit {
            rank: i + 1,
            full_length: p.content.chars().count(),
            content: preview(&p.content, PREVIEW_CHARS),
            metadata: p.metadata,
        })
        .collect();

    Ok(Json(VectorStoreResponse {
        query,
        k,
        results_count: results.len(),
        results,
        timestamp: Utc::now(),
    }))
}

/// GET /visa-requirements/{destination}/{visa_type}
pub async fn visa_requirements(
    State(state): State<AppState>,
    Path((destination, visa_type)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let query = format!("What are the requirements for a {visa_type} visa to {destination}?");
    let passages = state.retrieve(&query, REQUIREMENTS_K).await?;

    if passages.is_empty() {
        return Ok(Json(serde_json::json!({
            "destination": destination,
            "visa_type": visa_type,
            "status": "not_found",
            "message": format!("No requirements found for {visa_type} visa to {destination}"),
        })));
    }

    let requirements: Vec<Requirement> = passages
        .into_iter()
        .map(|p| Requirement {
            content: prefix(&p.content, REQUIREMENT_CHARS),
            metadata: p.metadata,
        })
        .collect();

    Ok(Json(serde_json::json!({
        "destination": destination,
        "visa_type": visa_type,
        "status": "success",
        "total_documents": requirements.len(),
        "requirements": requirements,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_text_untouched() {
        assert_eq!(preview("short", 500), "short");
        let exact = "a".repeat(500);
        assert_eq!(preview(&exact, 500), exact);
    }

    #[test]
    fn test_preview_long_text_marked() {
        let long = "b".repeat(900);
        let cut = preview(&long, 500);
        assert_eq!(cut.chars().count(), 503);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let text = "é".repeat(600);
        let cut = preview(&text, 500);
        assert_eq!(cut.chars().count(), 503);
    }

    #[test]
    fn test_prefix_has_no_marker() {
        assert_eq!(prefix(&"c".repeat(1000), 800).len(), 800);
    }
}
