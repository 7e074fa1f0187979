//! # swiftvisa
//!
//! Visa eligibility backend. A traveller profile goes in, a plain-text
//! eligibility assessment comes out, produced either by a language model
//! grounded in retrieved policy passages or, when no model is usable, by
//! the single most relevant policy excerpt.
//!
//! ## Answer flow
//!
//! ```text
//!            ┌──────────────────┐
//!            │ EligibilityQuery │
//!            └────────┬─────────┘
//!                     │ compose_prompt
//!                     ▼
//!          usable credential? ──no──────────────┐
//!                     │ yes                     │
//!                     ▼                         │
//!        ┌──────────────────────────┐           │
//!        │ retrieve TOP_K passages   │           │
//!        │ generate (with timeout)   │──error───┤
//!        └───────────┬──────────────┘           │
//!                    │ ok                       ▼
//!                    │              ┌─────────────────────────┐
//!                    │              │ retrieve k=1            │
//!                    │              │ excerpt or NOT_FOUND    │
//!                    │              └───────────┬─────────────┘
//!                    ▼                          ▼
//!            provider = "llm"       provider = "retrieval-only"
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration and the credential check
//! - [`models`] - Request/response types and corpus chunk records
//! - [`traits`] - `DocumentStore` and `LanguageModel` collaborator seams
//! - [`resolver`] - The eligibility resolver with its fallback policy
//! - [`corpus`] - Corpus directory catalog, file-name metadata and text cleaning
//! - [`chunking`] - Recursive character splitting of corpus files
//! - [`search`] - BM25 + vector corpus index fused with RRF
//! - [`llm`] - OpenAI chat completions and embedding clients
//! - [`ingest`] - Clean, chunk, export and index the corpus
//! - [`api`] - Axum handlers and router
//! - [`state`] - Shared application state

pub mod api;
pub mod chunking;
pub mod config;
pub mod corpus;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod resolver;
pub mod search;
pub mod state;
pub mod traits;
