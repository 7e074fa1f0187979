use async_trait::async_trait;

use crate::error::{GenerationError, RetrievalError};
use crate::models::RetrievedPassage;

/// Ranked passage lookup over the visa policy corpus.
///
/// Implementations must tolerate concurrent calls.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize)
        -> Result<Vec<RetrievedPassage>, RetrievalError>;
}

/// Generative completion over a prompt and retrieved context.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        context: &[RetrievedPassage],
    ) -> Result<String, GenerationError>;
}
