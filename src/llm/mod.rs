//! Clients for the external model services: chat completion and embeddings.

pub mod chat;
pub mod embeddings;
