use std::time::Duration;

use thiserror::Error;

/// Failure of a Document Store lookup.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("document store query failed: {0}")]
    Backend(String),

    #[error("document store did not answer within {0:?}")]
    Timeout(Duration),

    #[error("document store task panicked or was cancelled: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<anyhow::Error> for RetrievalError {
    fn from(e: anyhow::Error) -> Self {
        RetrievalError::Backend(format!("{e:#}"))
    }
}

/// Failure of a Language Model call. Always recoverable by the resolver.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("chat API returned no choices")]
    EmptyResponse,

    #[error("language model did not answer within {0:?}")]
    Timeout(Duration),
}
