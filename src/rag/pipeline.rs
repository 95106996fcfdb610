//! Retrieval-augmented answering.
//!
//! [`RagPipeline`] wires the pieces together: retrieve the top passages for a
//! question, assemble them into bounded context, render the prompt and ask
//! the generation service. It also owns the ingestion path
//! (embed → insert → flush) so both directions agree on one collection.

use std::sync::Arc;

use ragkit_vector::NewDocument;
use tracing::{info, instrument, warn};

use super::context::ContextAssembler;
use super::embeddings::Embedder;
use super::retriever::Retriever;
use crate::db::VectorStore;
use crate::llm::LLMClient;
use crate::types::{AppError, Answer, IngestReport, Result, RetrievedPassage};

/// Prompt used when no template is configured.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "You are a helpful AI assistant with access to retrieved context documents.
Use the information below to answer the user's question accurately.

Context:
{context}

User Question: {question}

Answer:";

pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 4000;

/// Fill `{context}` and `{question}` in `template`.
pub fn render_prompt(template: &str, context: &str, question: &str) -> String {
    template
        .replace("{context}", context)
        .replace("{question}", question)
}

pub struct RagPipeline {
    retriever: Retriever,
    assembler: ContextAssembler,
    llm: Arc<dyn LLMClient>,
    top_k: usize,
    max_context_chars: usize,
    template: String,
}

impl std::fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("retriever", &self.retriever)
            .field("assembler", &self.assembler)
            .field("llm", &self.llm.model_name())
            .field("top_k", &self.top_k)
            .field("max_context_chars", &self.max_context_chars)
            .finish()
    }
}

impl RagPipeline {
    pub fn new(retriever: Retriever, llm: Arc<dyn LLMClient>) -> Self {
        Self {
            retriever,
            assembler: ContextAssembler::default(),
            llm,
            top_k: DEFAULT_TOP_K,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }

    pub fn with_assembler(mut self, assembler: ContextAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_max_context_chars(mut self, max_context_chars: usize) -> Self {
        self.max_context_chars = max_context_chars;
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Answer `question` from the collection.
    ///
    /// # Errors
    ///
    /// Retrieval errors pass through unchanged. A generation failure becomes
    /// [`AppError::UpstreamGeneration`] carrying the retrieved passages.
    #[instrument(skip(self, question), fields(model = self.llm.model_name(), top_k = self.top_k))]
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let passages = self.retriever.retrieve(question, self.top_k).await?;
        let context = self.assembler.assemble(&passages, self.max_context_chars);
        if context.is_empty() {
            warn!("No passage fits the context budget; prompting without context");
        }
        let prompt = render_prompt(&self.template, &context, question.trim());

        let answer = match self.llm.generate(&prompt).await {
            Ok(answer) => answer,
            Err(e) => return Err(with_passages(e, passages)),
        };

        info!(passages = passages.len(), "Answer generated");
        Ok(Answer {
            question: question.to_string(),
            answer,
            passages,
            model: self.llm.model_name().to_string(),
        })
    }

    /// Embed `texts` in one batch, insert them as one batch and flush.
    ///
    /// Nothing is stored when any text fails to embed or validate.
    pub async fn ingest(&self, texts: &[String]) -> Result<IngestReport> {
        ingest_texts(
            self.retriever.embedder().as_ref(),
            self.retriever.store().as_ref(),
            &self.retriever.config().collection,
            texts,
        )
        .await
    }
}

/// Embed `texts` in one batch, insert them into `collection` as one batch
/// and flush.
#[instrument(skip(embedder, store, texts), fields(count = texts.len()))]
pub async fn ingest_texts(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    collection: &str,
    texts: &[String],
) -> Result<IngestReport> {
    if texts.is_empty() {
        return Ok(IngestReport::default());
    }

    let vectors = embedder.embed(texts).await?;
    if vectors.len() != texts.len() {
        return Err(AppError::Encoding(format!(
            "embedder returned {} vectors for {} texts",
            vectors.len(),
            texts.len()
        )));
    }
    let documents: Vec<NewDocument> = texts
        .iter()
        .zip(vectors)
        .map(|(text, vector)| NewDocument::new(text.trim(), vector))
        .collect();

    let inserted = store.insert(collection, &documents).await?;
    let flushed = store.flush(collection).await?;

    info!(inserted = inserted.len(), flushed, "Ingested documents");
    Ok(IngestReport { inserted })
}

fn with_passages(err: AppError, passages: Vec<RetrievedPassage>) -> AppError {
    match err {
        AppError::UpstreamGeneration { message, .. } => {
            AppError::UpstreamGeneration { message, passages }
        }
        other => AppError::UpstreamGeneration {
            message: other.to_string(),
            passages,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_prompt() {
        let prompt = render_prompt(DEFAULT_PROMPT_TEMPLATE, "ctx line", "why?");
        assert!(prompt.contains("Context:\nctx line\n"));
        assert!(prompt.contains("User Question: why?"));
        assert!(prompt.ends_with("Answer:"));
        assert!(!prompt.contains("{context}"));
    }

    #[test]
    fn test_with_passages_keeps_message() {
        let passages = vec![RetrievedPassage {
            id: ragkit_vector::DocumentId(7),
            text: "p".into(),
            score: 0.5,
        }];
        let err = with_passages(
            AppError::UpstreamGeneration {
                message: "boom".into(),
                passages: vec![],
            },
            passages.clone(),
        );
        match err {
            AppError::UpstreamGeneration { message, passages: kept } => {
                assert_eq!(message, "boom");
                assert_eq!(kept, passages);
            }
            other => panic!("unexpected {other:?}"),
        }

        let wrapped = with_passages(AppError::Store("disk".into()), vec![]);
        assert!(matches!(wrapped, AppError::UpstreamGeneration { .. }));
    }
}
