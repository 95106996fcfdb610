//! Generation clients.
//!
//! Retrieval never depends on this module; only [`RagPipeline`](crate::rag::pipeline::RagPipeline)
//! calls an [`LLMClient`] to turn assembled context into an answer.
//!
//! Enable providers via Cargo features:
//! - `ollama` (default) - local Ollama server through `ollama-rs`

/// Core LLM client trait and provider selection.
pub mod client;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use client::{LLMClient, Provider};

#[cfg(feature = "ollama")]
pub use ollama::OllamaClient;
