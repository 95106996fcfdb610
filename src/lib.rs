//! # ragkit - retrieval core for RAG
//!
//! Embeds texts into a vector collection, retrieves the passages most similar
//! to a question and assembles them into bounded prompt context for a
//! generation model.
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use ragkit::db::{EmbeddedVectorStore, VectorStore};
//! use ragkit::rag::{HashEmbedder, RagPipeline, Retriever, RetrieverConfig};
//! use ragkit_vector::{CollectionSchema, DistanceMetric};
//! use std::sync::Arc;
//!
//! let store = Arc::new(EmbeddedVectorStore::in_memory().await?);
//! store.create_collection(CollectionSchema::new("documents", 256, DistanceMetric::Cosine)).await?;
//!
//! let embedder = Arc::new(HashEmbedder::new(256)?);
//! let retriever = Retriever::connect(
//!     embedder,
//!     store,
//!     RetrieverConfig::new("documents", DistanceMetric::Cosine),
//! ).await?;
//!
//! let pipeline = RagPipeline::new(retriever, llm);
//! pipeline.ingest(&["Rust has no garbage collector.".to_string()]).await?;
//! let answer = pipeline.ask("Does Rust use GC?").await?;
//! println!("{}", answer.answer);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama generation client (default) |
//! | `local-embeddings` | fastembed sentence-transformer models |
//!
//! ## Modules
//!
//! - [`db`] - vector store abstraction and the embedded store
//! - [`rag`] - embedders, retriever, context assembly, pipeline
//! - [`llm`] - generation clients
//! - [`cli`] - command-line interface
//! - [`types`] - common types and error handling
//! - [`utils`] - configuration

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Command-line interface.
pub mod cli;
/// Vector stores.
pub mod db;
/// LLM provider clients.
pub mod llm;
/// Retrieval Augmented Generation (RAG) components.
pub mod rag;
/// Core types and errors.
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use db::{EmbeddedVectorStore, VectorStore, VectorStoreProvider};
pub use llm::{LLMClient, Provider};
pub use rag::{ContextAssembler, Embedder, RagPipeline, RankingPath, Retriever, RetrieverConfig};
pub use types::{AppError, Answer, ErrorKind, IngestReport, Result, RetrievedPassage};
pub use utils::toml_config::RagConfig;

#[cfg(feature = "ollama")]
pub use llm::OllamaClient;
