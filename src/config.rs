use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const APP_NAME: &str = "SwiftVisa";
pub const APP_VERSION: &str = "1.0.0";

/// Origins always allowed by the CORS layer; `ALLOWED_ORIGINS` appends to these.
const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:8501",
    "https://swiftvisa.streamlit.app",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// Where the BM25 index, vectors and chunk export are persisted
    pub vectorstore_dir: PathBuf,
    /// Flat directory of cleaned `.txt` corpus files
    pub clean_dir: PathBuf,
    /// Raw corpus files consumed by `ingest`
    pub raw_dir: PathBuf,
    /// Passages handed to the LLM as context
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Bound on each Document Store call, in seconds
    pub retrieval_timeout_secs: u64,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub allowed_origins: Vec<String>,
    /// Emit JSON log lines instead of the human-readable format
    pub log_json: bool,
}

/// Chat completion settings. Only OpenAI-compatible endpoints are supported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL for the chat API
    pub base_url: String,
    pub chat_model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Bound on each generation call, in seconds
    pub timeout_secs: u64,
}

/// Embedding backend used by the vector half of the corpus index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "ollama", "openai" or "none"
    pub provider: String,
    pub base_url: String,
    pub model: String,
    /// Only needed for OpenAI-compatible providers
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            vectorstore_dir: PathBuf::from("vectorstore"),
            clean_dir: PathBuf::from("data/clean"),
            raw_dir: PathBuf::from("data/raw"),
            top_k: 5,
            chunk_size: 1000,
            chunk_overlap: 150,
            retrieval_timeout_secs: 30,
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            log_json: false,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            api_key: None,
            temperature: 0.0,
            max_tokens: 1000,
            timeout_secs: 60,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(),
            api_key: None,
        }
    }
}

impl LlmConfig {
    /// Whether the configured credential passes the format sanity check.
    ///
    /// A key must start with `sk-`, must not look like a `your-...`
    /// placeholder, and must be longer than 20 characters. Keys failing the
    /// check are treated as absent and never sent anywhere.
    pub fn has_usable_credential(&self) -> bool {
        match self.api_key.as_deref() {
            Some(key) => {
                !key.is_empty()
                    && key.starts_with("sk-")
                    && !key.to_lowercase().contains("your-")
                    && key.len() > 20
            }
            None => false,
        }
    }

    /// Provider label reported by the health and stats endpoints.
    pub fn provider_label(&self) -> &'static str {
        if self.has_usable_credential() {
            "openai"
        } else {
            "none"
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "none"
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unparseable numeric
    /// values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8000);
        config.bind_addr = format!("{host}:{port}");

        if let Some(dir) = lookup("VECTORSTORE_DIR") {
            config.vectorstore_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("DATA_CLEAN_DIR") {
            config.clean_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("DATA_RAW_DIR") {
            config.raw_dir = PathBuf::from(dir);
        }
        if let Some(v) = lookup("TOP_K").and_then(|v| v.parse().ok()) {
            config.top_k = v;
        }
        if let Some(v) = lookup("CHUNK_SIZE").and_then(|v| v.parse().ok()) {
            config.chunk_size = v;
        }
        if let Some(v) = lookup("CHUNK_OVERLAP").and_then(|v| v.parse().ok()) {
            config.chunk_overlap = v;
        }
        if let Some(v) = lookup("RETRIEVAL_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            config.retrieval_timeout_secs = v;
        }

        // LLM
        if let Some(key) = lookup("OPENAI_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Some(v) = lookup("LLM_TEMPERATURE").and_then(|v| v.parse().ok()) {
            config.llm.temperature = v;
        }
        if let Some(v) = lookup("LLM_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            config.llm.max_tokens = v;
        }
        if let Some(v) = lookup("LLM_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            config.llm.timeout_secs = v;
        }

        // Embeddings
        if let Some(provider) = lookup("EMBEDDING_PROVIDER") {
            config.embedding.provider = provider.to_lowercase();
        }
        if let Some(url) = lookup("EMBEDDING_BASE_URL") {
            config.embedding.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        if config.embedding.provider == "openai" {
            config.embedding.api_key = config.llm.api_key.clone();
        }

        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            config.allowed_origins.extend(
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string),
            );
        }

        config.log_json = lookup("LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        config
    }

    pub fn bm25_dir(&self) -> PathBuf {
        self.vectorstore_dir.join("bm25")
    }

    pub fn vector_dir(&self) -> PathBuf {
        self.vectorstore_dir.join("vectors")
    }

    pub fn chunks_path(&self) -> PathBuf {
        self.vectorstore_dir.join("chunks").join("visa_chunks.jsonl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| env.get(k).cloned())
    }

    fn llm_with_key(key: Option<&str>) -> LlmConfig {
        LlmConfig {
            api_key: key.map(str::to_string),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_defaults_without_env() {
        let config = config_with(&[]);
        assert_eq!(config.bind_addr, "0.0.0.0:8000");
        assert_eq!(config.top_k, 5);
        assert_eq!(config.clean_dir, PathBuf::from("data/clean"));
        assert_eq!(config.llm.chat_model, "gpt-3.5-turbo");
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.allowed_origins.len(), 3);
    }

    #[test]
    fn test_env_overrides() {
        let config = config_with(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9001"),
            ("TOP_K", "3"),
            ("VECTORSTORE_DIR", "/tmp/vs"),
            ("EMBEDDING_PROVIDER", "NONE"),
            ("ALLOWED_ORIGINS", "https://a.example, ,https://b.example"),
        ]);
        assert_eq!(config.bind_addr, "127.0.0.1:9001");
        assert_eq!(config.top_k, 3);
        assert_eq!(config.bm25_dir(), PathBuf::from("/tmp/vs/bm25"));
        assert!(!config.embedding.is_enabled());
        assert_eq!(config.allowed_origins.len(), 5);
        assert!(config
            .allowed_origins
            .contains(&"https://b.example".to_string()));
    }

    #[test]
    fn test_bad_numbers_keep_defaults() {
        let config = config_with(&[("TOP_K", "many"), ("PORT", "eighty")]);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.bind_addr, "0.0.0.0:8000");
    }

    #[test]
    fn test_openai_embeddings_reuse_llm_key() {
        let config = config_with(&[
            ("EMBEDDING_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "sk-abcdefghijklmnopqrstuvwxyz"),
        ]);
        assert_eq!(
            config.embedding.api_key.as_deref(),
            Some("sk-abcdefghijklmnopqrstuvwxyz")
        );
    }

    #[test]
    fn test_credential_gate() {
        assert!(!llm_with_key(None).has_usable_credential());
        assert!(!llm_with_key(Some("")).has_usable_credential());
        // wrong prefix
        assert!(!llm_with_key(Some("pk-abcdefghijklmnopqrstuvwxyz")).has_usable_credential());
        // placeholder
        assert!(!llm_with_key(Some("sk-your-openai-key-goes-here")).has_usable_credential());
        assert!(!llm_with_key(Some("sk-YOUR-KEY-HERE-0123456789")).has_usable_credential());
        // too short: exactly 20 chars
        assert!(!llm_with_key(Some("sk-12345678901234567")).has_usable_credential());
        // 21 chars
        assert!(llm_with_key(Some("sk-123456789012345678")).has_usable_credential());
        assert!(llm_with_key(Some("sk-proj-abcdefghijklmnopqrstuvwxyz0123")).has_usable_credential());
    }

    #[test]
    fn test_provider_label() {
        assert_eq!(llm_with_key(None).provider_label(), "none");
        assert_eq!(
            llm_with_key(Some("sk-abcdefghijklmnopqrstuvwxyz")).provider_label(),
            "openai"
        );
    }
}
