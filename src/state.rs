use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::corpus::CorpusCatalog;
use crate::error::RetrievalError;
use crate::llm::chat::OpenAiChat;
use crate::models::RetrievedPassage;
use crate::resolver::{Resolver, ResolverSettings};
use crate::search::CorpusIndex;
use crate::traits::{DocumentStore, LanguageModel};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub resolver: Arc<Resolver>,
    /// Used directly by the endpoints that bypass the resolver
    pub store: Arc<dyn DocumentStore>,
    /// The concrete index behind `store`, when it is one
    pub index: Option<Arc<CorpusIndex>>,
    pub catalog: CorpusCatalog,
}

impl AppState {
    /// Open the persisted corpus index and wire up the real collaborators.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.vectorstore_dir)?;

        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;

        let index = Arc::new(CorpusIndex::open_or_create(
            &config.vectorstore_dir,
            config.embedding.clone(),
            http_client.clone(),
        )?);
        tracing::info!(
            "Corpus index loaded: {} chunks ({} embedded)",
            index.chunk_count(),
            index.embedded_count()
        );

        let llm = config.llm.has_usable_credential().then(|| {
            Arc::new(OpenAiChat::new(http_client, config.llm.clone())) as Arc<dyn LanguageModel>
        });

        let mut state = Self::with_collaborators(config, index.clone(), llm);
        state.index = Some(index);
        Ok(state)
    }

    /// Build state around arbitrary collaborators. The language model is
    /// still subject to the credential check in `config.llm`.
    pub fn with_collaborators(
        config: Config,
        store: Arc<dyn DocumentStore>,
        llm: Option<Arc<dyn LanguageModel>>,
    ) -> Self {
        let mut resolver = Resolver::new(store.clone(), ResolverSettings::from_config(&config));
        if let Some(llm) = llm {
            resolver = resolver.with_language_model(&config.llm, llm);
        }

        Self {
            catalog: CorpusCatalog::new(&config.clean_dir),
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            store,
            index: None,
        }
    }

    pub fn vectorstore_loaded(&self) -> bool {
        match &self.index {
            Some(index) => !index.is_empty(),
            None => self.config.vectorstore_dir.exists(),
        }
    }

    pub fn chunks_indexed(&self) -> usize {
        self.index.as_ref().map_or(0, |i| i.chunk_count())
    }

    /// Direct Document Store lookup, bounded like the resolver's own calls.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        let timeout = Duration::from_secs(self.config.retrieval_timeout_secs);
        tokio::time::timeout(timeout, self.store.retrieve(query, k))
            .await
            .map_err(|_| RetrievalError::Timeout(timeout))?
    }
}
