use std::path::Path as FsPath;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;

use crate::config::{APP_NAME, APP_VERSION};
use crate::models::{CountriesResponse, HealthResponse, StatsResponse, VisaTypesResponse};
use crate::state::AppState;

/// GET /
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": format!("{APP_NAME} API v{APP_VERSION} is running"),
    }))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let llm_available = state.resolver.llm_available();
    Json(HealthResponse {
        status: "healthy",
        service: format!("{APP_NAME} API"),
        timestamp: Utc::now(),
        vectorstore_loaded: state.vectorstore_loaded(),
        llm_available,
        llm_provider: llm_available.then(|| state.config.llm.provider_label()),
    })
}

/// GET /stats
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let catalog = state.catalog.stats();
    let size_mb = directory_size_mb(&state.config.vectorstore_dir);

    Json(StatsResponse {
        status: "operational",
        timestamp: Utc::now(),
        documents_loaded: catalog.documents,
        countries_available: catalog.countries.len(),
        countries: catalog.countries,
        visa_types_count: catalog.visa_types.len(),
        vectorstore_size_mb: size_mb,
        chunks_indexed: state.chunks_indexed(),
        embedding_model: state.config.embedding.model.clone(),
        llm_enabled: state.resolver.llm_available(),
        llm_provider: if state.resolver.llm_available() {
            state.config.llm.provider_label()
        } else {
            "none"
        },
        top_k_retrieval: state.config.top_k,
        api_version: APP_VERSION,
    })
}

/// GET /countries
pub async fn countries(State(state): State<AppState>) -> Json<CountriesResponse> {
    let countries = state.catalog.countries();
    Json(CountriesResponse {
        count: countries.len(),
        countries,
    })
}

/// GET /visa-types/{country}
pub async fn visa_types(
    State(state): State<AppState>,
    Path(country): Path<String>,
) -> Json<VisaTypesResponse> {
    let visa_types = state.catalog.visa_types(&country);
    Json(VisaTypesResponse {
        country,
        count: visa_types.len(),
        visa_types,
    })
}

/// Total size of the files under `dir`, in MiB rounded to two decimals.
fn directory_size_mb(dir: &FsPath) -> f64 {
    let bytes: u64 = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum();
    let mb = bytes as f64 / (1024.0 * 1024.0);
    (mb * 100.0).round() / 100.0
}
