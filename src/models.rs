use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Visa profile submitted by the frontend.
///
/// Wire names follow the React client; the short names are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityQuery {
    #[serde(rename = "countryOfCitizenship", alias = "citizenship")]
    pub citizenship: String,
    #[serde(rename = "destinationCountry", alias = "destination")]
    pub destination: String,
    #[serde(rename = "purposeOfVisit", alias = "purpose")]
    pub purpose: String,
    #[serde(rename = "lengthOfStay", alias = "stayLength")]
    pub stay_length: String,
    pub age: String,
}

/// A passage returned by the Document Store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl RetrievedPassage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Map::new(),
        }
    }
}

/// A single indexed slice of a corpus file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusChunk {
    /// `<file_name>_chunk<i>`
    pub chunk_id: String,
    /// Corpus file name the chunk came from
    pub source: String,
    pub country: Option<String>,
    pub visa_type: Option<String>,
    pub chunk_index: usize,
    pub content: String,
}

impl CorpusChunk {
    /// Metadata exposed alongside the chunk content in API responses.
    pub fn metadata(&self, score: f32) -> Map<String, Value> {
        let mut meta = Map::new();
        meta.insert("source".into(), Value::String(self.source.clone()));
        if let Some(country) = &self.country {
            meta.insert("country".into(), Value::String(country.clone()));
        }
        if let Some(visa_type) = &self.visa_type {
            meta.insert("visa_type".into(), Value::String(visa_type.clone()));
        }
        meta.insert("chunk_index".into(), Value::from(self.chunk_index));
        meta.insert("score".into(), Value::from(score as f64));
        meta
    }

    pub fn into_passage(self, score: f32) -> RetrievedPassage {
        RetrievedPassage {
            metadata: self.metadata(score),
            content: self.content,
        }
    }
}

/// Which path actually produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "llm")]
    Llm,
    #[serde(rename = "retrieval-only")]
    RetrievalOnly,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Llm => "llm",
            Provider::RetrievalOnly => "retrieval-only",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EligibilityResult {
    pub text: String,
    pub provider: Provider,
    pub timestamp: DateTime<Utc>,
}

/// POST /check-eligibility response
#[derive(Debug, Clone, Serialize)]
pub struct EligibilityResponse {
    pub eligibility: String,
    pub provider: Provider,
    pub timestamp: DateTime<Utc>,
}

impl From<EligibilityResult> for EligibilityResponse {
    fn from(r: EligibilityResult) -> Self {
        Self {
            eligibility: r.text,
            provider: r.provider,
            timestamp: r.timestamp,
        }
    }
}

/// POST /analyze-profile response
#[derive(Debug, Clone, Serialize)]
pub struct ProfileAnalysisResponse {
    pub status: &'static str,
    pub analysis: String,
    pub provider: Provider,
    pub profile: EligibilityQuery,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// POST /vectorstore/query request
#[derive(Debug, Clone, Deserialize)]
pub struct VectorStoreQuery {
    pub query: String,
    pub k: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VectorStoreHit {
    pub rank: usize,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub full_length: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct VectorStoreResponse {
    pub query: String,
    pub k: usize,
    pub results_count: usize,
    pub results: Vec<VectorStoreHit>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Requirement {
    pub content: String,
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
    pub timestamp: DateTime<Utc>,
    pub vectorstore_loaded: bool,
    pub llm_available: bool,
    pub llm_provider: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub documents_loaded: usize,
    pub countries_available: usize,
    pub countries: Vec<String>,
    pub visa_types_count: usize,
    pub vectorstore_size_mb: f64,
    pub chunks_indexed: usize,
    pub embedding_model: String,
    pub llm_enabled: bool,
    pub llm_provider: &'static str,
    pub top_k_retrieval: usize,
    pub api_version: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountriesResponse {
    pub countries: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisaTypesResponse {
    pub country: String,
    pub visa_types: Vec<String>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_accepts_frontend_names() {
        let q: EligibilityQuery = serde_json::from_value(serde_json::json!({
            "countryOfCitizenship": "India",
            "destinationCountry": "Canada",
            "purposeOfVisit": "Study",
            "lengthOfStay": "365",
            "age": "25"
        }))
        .unwrap();
        assert_eq!(q.citizenship, "India");
        assert_eq!(q.stay_length, "365");
    }

    #[test]
    fn test_query_accepts_short_names() {
        let q: EligibilityQuery = serde_json::from_value(serde_json::json!({
            "citizenship": "India",
            "destination": "Canada",
            "purpose": "Study",
            "stayLength": "365",
            "age": "25"
        }))
        .unwrap();
        assert_eq!(q.destination, "Canada");
        assert_eq!(q.purpose, "Study");
    }

    #[test]
    fn test_query_missing_field_names_it() {
        let err = serde_json::from_value::<EligibilityQuery>(serde_json::json!({
            "countryOfCitizenship": "India",
            "destinationCountry": "Canada"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("purposeOfVisit"));
    }

    #[test]
    fn test_provider_serializes_to_wire_names() {
        assert_eq!(serde_json::to_value(Provider::Llm).unwrap(), "llm");
        assert_eq!(
            serde_json::to_value(Provider::RetrievalOnly).unwrap(),
            "retrieval-only"
        );
    }
}
