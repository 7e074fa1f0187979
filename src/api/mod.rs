//! HTTP surface: axum handlers and the router that mounts them.

pub mod catalog;
pub mod eligibility;
pub mod vectorstore;

use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::RetrievalError;
use crate::state::AppState;

/// Errors surfaced to HTTP callers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Invalid request body")]
    InvalidBody(#[from] JsonRejection),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response(),
            ApiError::Retrieval(ref e) => {
                tracing::error!("Request failed: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": self.to_string() })),
                )
                    .into_response()
            }
            ApiError::InvalidBody(rejection) => (
                rejection.status(),
                Json(serde_json::json!({
                    "error": "Invalid request body",
                    "detail": rejection.body_text(),
                })),
            )
                .into_response(),
        }
    }
}

/// Build the router with every endpoint, CORS and request tracing.
pub fn router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(catalog::root))
        .route("/health", get(catalog::health))
        .route("/stats", get(catalog::stats))
        .route("/countries", get(catalog::countries))
        .route("/visa-types/{country}", get(catalog::visa_types))
        .route("/check-eligibility", post(eligibility::check_eligibility))
        .route("/analyze-profile", post(eligibility::analyze_profile))
        .route("/vectorstore/query", post(vectorstore::query))
        .route(
            "/visa-requirements/{destination}/{visa_type}",
            get(vectorstore::visa_requirements),
        )
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
