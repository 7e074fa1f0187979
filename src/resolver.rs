//! Eligibility resolution: LLM-augmented answer when a usable credential is
//! configured, otherwise (or on any LLM-path failure) the best matching
//! policy excerpt.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::config::{Config, LlmConfig};
use crate::error::{GenerationError, RetrievalError};
use crate::models::{EligibilityQuery, EligibilityResult, Provider, RetrievedPassage};
use crate::traits::{DocumentStore, LanguageModel};

pub const NOT_FOUND_MESSAGE: &str = "No relevant visa information found for your query. \
Please try different search terms or contact support.";

/// Which question to ask about a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    /// Short eligibility determination (`/check-eligibility`)
    Eligibility,
    /// Status, requirements, recommendations and next steps (`/analyze-profile`)
    ProfileAnalysis,
}

pub fn compose_prompt(query: &EligibilityQuery, style: PromptStyle) -> String {
    match style {
        PromptStyle::Eligibility => format!(
            "Determine eligibility for a {} visa to {} for a citizen of {}, aged {}, \
             staying {} days. Provide reasoning and reference policy data.",
            query.purpose, query.destination, query.citizenship, query.age, query.stay_length
        ),
        PromptStyle::ProfileAnalysis => format!(
            "Analyze visa eligibility comprehensively for:\n\
             - Citizen of: {}\n\
             - Destination: {}\n\
             - Purpose: {}\n\
             - Duration: {} days\n\
             - Age: {} years\n\n\
             Provide: 1) Eligibility status, 2) Key requirements, 3) Recommendations, 4) Next steps",
            query.citizenship, query.destination, query.purpose, query.stay_length, query.age
        ),
    }
}

/// Wrap a policy passage for display in retrieval-only mode.
pub fn format_excerpt(content: &str) -> String {
    format!(
        "VISA ELIGIBILITY ASSESSMENT\n\n\
         Based on the most relevant visa policy document:\n\n\
         {}\n\n\
         ---\n\
         Note: This result is based on official visa policy documents. For the most accurate \
         and up-to-date information, please verify with the official embassy or consulate.",
        content.trim()
    )
}

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Passages handed to the language model
    pub top_k: usize,
    pub retrieval_timeout: Duration,
    pub generation_timeout: Duration,
}

impl ResolverSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_k: config.top_k.max(1),
            retrieval_timeout: Duration::from_secs(config.retrieval_timeout_secs),
            generation_timeout: Duration::from_secs(config.llm.timeout_secs),
        }
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Why the LLM path gave up.
#[derive(Debug)]
enum LlmPathError {
    Retrieval(RetrievalError),
    Generation(GenerationError),
}

impl std::fmt::Display for LlmPathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmPathError::Retrieval(e) => write!(f, "context retrieval failed: {e}"),
            LlmPathError::Generation(e) => write!(f, "generation failed: {e}"),
        }
    }
}

pub struct Resolver {
    store: Arc<dyn DocumentStore>,
    llm: Option<Arc<dyn LanguageModel>>,
    settings: ResolverSettings,
}

impl Resolver {
    /// A resolver with no language model: every answer is retrieval-only.
    pub fn new(store: Arc<dyn DocumentStore>, settings: ResolverSettings) -> Self {
        Self {
            store,
            llm: None,
            settings,
        }
    }

    /// Attach a language model, but only if `llm_config` carries a credential
    /// that passes the format check. Otherwise the model is dropped unused.
    pub fn with_language_model(mut self, llm_config: &LlmConfig, llm: Arc<dyn LanguageModel>) -> Self {
        if llm_config.has_usable_credential() {
            self.llm = Some(llm);
        } else {
            tracing::info!("No usable LLM credential configured; answering in retrieval-only mode");
        }
        self
    }

    pub fn llm_available(&self) -> bool {
        self.llm.is_some()
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub async fn resolve(&self, query: &EligibilityQuery) -> Result<EligibilityResult, RetrievalError> {
        tracing::info!(
            destination = %query.destination,
            purpose = %query.purpose,
            "eligibility check"
        );
        self.resolve_prompt(&compose_prompt(query, PromptStyle::Eligibility))
            .await
    }

    pub async fn analyze(&self, query: &EligibilityQuery) -> Result<EligibilityResult, RetrievalError> {
        tracing::info!(
            destination = %query.destination,
            purpose = %query.purpose,
            "profile analysis"
        );
        self.resolve_prompt(&compose_prompt(query, PromptStyle::ProfileAnalysis))
            .await
    }

    /// Answer `prompt`, preferring the language model and falling back to
    /// the single best passage. Only a fallback retrieval failure is an error.
    pub async fn resolve_prompt(&self, prompt: &str) -> Result<EligibilityResult, RetrievalError> {
        if let Some(llm) = &self.llm {
            let started = Instant::now();
            tracing::info!(mode = "llm", "resolving with language model");
            match self.answer_with_llm(llm.as_ref(), prompt).await {
                Ok(text) => {
                    tracing::info!(
                        mode = "llm",
                        latency_ms = started.elapsed().as_millis() as u64,
                        "language model answer ready"
                    );
                    return Ok(EligibilityResult {
                        text,
                        provider: Provider::Llm,
                        timestamp: Utc::now(),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        mode = "llm",
                        latency_ms = started.elapsed().as_millis() as u64,
                        "LLM path failed, falling back to retrieval-only: {e}"
                    );
                }
            }
        }

        let started = Instant::now();
        tracing::info!(mode = "retrieval-only", "resolving with document retrieval");
        let text = match self.retrieve(prompt, 1).await {
            Ok(passages) => match passages.into_iter().next() {
                Some(top) => format_excerpt(&top.content),
                None => {
                    tracing::warn!(mode = "retrieval-only", "no documents retrieved");
                    NOT_FOUND_MESSAGE.to_string()
                }
            },
            Err(e) => {
                tracing::error!(
                    mode = "retrieval-only",
                    latency_ms = started.elapsed().as_millis() as u64,
                    "retrieval failed: {e}"
                );
                return Err(e);
            }
        };

        tracing::info!(
            mode = "retrieval-only",
            latency_ms = started.elapsed().as_millis() as u64,
            "retrieval answer ready"
        );
        Ok(EligibilityResult {
            text,
            provider: Provider::RetrievalOnly,
            timestamp: Utc::now(),
        })
    }

    async fn answer_with_llm(&self, llm: &dyn LanguageModel, prompt: &str) -> Result<String, LlmPathError> {
        let context = self
            .retrieve(prompt, self.settings.top_k)
            .await
            .map_err(LlmPathError::Retrieval)?;

        let timeout = self.settings.generation_timeout;
        match tokio::time::timeout(timeout, llm.generate(prompt, &context)).await {
            Ok(result) => result.map_err(LlmPathError::Generation),
            Err(_) => Err(LlmPathError::Generation(GenerationError::Timeout(timeout))),
        }
    }

    async fn retrieve(&self, prompt: &str, k: usize) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        let timeout = self.settings.retrieval_timeout;
        tokio::time::timeout(timeout, self.store.retrieve(prompt, k))
            .await
            .map_err(|_| RetrievalError::Timeout(timeout))?
    }
}
