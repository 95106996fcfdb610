//! Retrieval Augmented Generation (RAG) Pipeline
//!
//! # Module Structure
//!
//! - [`rag::embeddings`](crate::rag::embeddings) - the [`Embedder`](embeddings::Embedder) trait, fastembed and feature-hash encoders
//! - [`rag::cache`](crate::rag::cache) - LRU cache in front of any embedder
//! - [`rag::retriever`](crate::rag::retriever) - top-k retrieval over a vector store
//! - [`rag::context`](crate::rag::context) - bounded context assembly
//! - [`rag::pipeline`](crate::rag::pipeline) - ingestion and question answering
//!
//! # RAG Pipeline
//!
//! 1. **Ingestion** - texts are embedded in one batch, inserted, flushed
//! 2. **Retrieval** - the question is embedded and the top `k` passages ranked
//! 3. **Assembly** - passages are joined under a character budget
//! 4. **Generation** - the LLM answers from the rendered prompt
//!
//! # Example
//!
//! ```ignore
//! use ragkit::rag::{RagPipeline, Retriever, RetrieverConfig};
//!
//! let retriever = Retriever::connect(embedder, store, RetrieverConfig::new("documents", DistanceMetric::Cosine)).await?;
//! let pipeline = RagPipeline::new(retriever, llm).with_top_k(3);
//!
//! pipeline.ingest(&texts).await?;
//! let answer = pipeline.ask("What is Rust?").await?;
//! ```

pub mod cache;
pub mod context;
pub mod embeddings;
pub mod pipeline;
pub mod retriever;

pub use cache::{CacheStats, CachedEmbedder};
pub use context::ContextAssembler;
pub use embeddings::{Embedder, EmbeddingModelType, HashEmbedder};
pub use pipeline::{ingest_texts, RagPipeline, DEFAULT_PROMPT_TEMPLATE};
pub use retriever::{RankingPath, Retriever, RetrieverConfig};

#[cfg(feature = "local-embeddings")]
pub use embeddings::FastEmbedEmbedder;
