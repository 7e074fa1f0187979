use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::ApiError;
use crate::models::{EligibilityQuery, EligibilityResponse, ProfileAnalysisResponse, Provider};
use crate::state::AppState;

const RETRIEVAL_ONLY_NOTE: &str =
    "LLM unavailable, showing the most relevant policy excerpt instead of a generated analysis";

/// POST /check-eligibility
pub async fn check_eligibility(
    State(state): State<AppState>,
    payload: Result<Json<EligibilityQuery>, JsonRejection>,
) -> Result<Json<EligibilityResponse>, ApiError> {
    let Json(query) = payload?;
    let result = state.resolver.resolve(&query).await?;
    Ok(Json(result.into()))
}

/// POST /analyze-profile - the richer prompt, with the profile echoed back.
/// Failures keep the profile in the body so the client can show what was asked.
pub async fn analyze_profile(
    State(state): State<AppState>,
    payload: Result<Json<EligibilityQuery>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(profile) = payload?;

    match state.resolver.analyze(&profile).await {
        Ok(result) => {
            let note = (result.provider == Provider::RetrievalOnly)
                .then(|| RETRIEVAL_ONLY_NOTE.to_string());
            Ok(Json(ProfileAnalysisResponse {
                status: "success",
                analysis: result.text,
                provider: result.provider,
                profile,
                timestamp: result.timestamp,
                note,
            })
            .into_response())
        }
        Err(e) => {
            tracing::error!("Profile analysis failed: {e}");
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "status": "error",
                    "error": e.to_string(),
                    "profile": profile,
                })),
            )
                .into_response())
        }
    }
}
