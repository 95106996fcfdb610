//! Vector stores.
//!
//! - [`vectorstore`]: the [`VectorStore`] trait and provider configuration
//! - [`embedded`]: the default store over `ragkit-vector`

#![allow(missing_docs)]

// Vector store abstraction layer
pub mod vectorstore;

// Provider implementations
pub mod embedded;

// Re-exports
pub use embedded::EmbeddedVectorStore;
pub use vectorstore::{VectorStore, VectorStoreProvider};
