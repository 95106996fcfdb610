//! Command handlers.
//!
//! [`Components`] builds the store, embedder and (lazily) the generation
//! client from a [`RagConfig`]; each `run_*` function implements one
//! subcommand on top of it.

use std::path::Path;
use std::sync::Arc;

use ragkit_vector::IndexBuild;
use tracing::{debug, info};

use super::output::Output;
use super::Commands;
use crate::db::{VectorStore, VectorStoreProvider};
use crate::llm::LLMClient;
use crate::rag::cache::CachedEmbedder;
use crate::rag::context::ContextAssembler;
use crate::rag::embeddings::{Embedder, HashEmbedder};
use crate::rag::pipeline::{ingest_texts, RagPipeline};
use crate::rag::retriever::Retriever;
use crate::types::{AppError, Result};
use crate::utils::toml_config::{EmbeddingProvider, RagConfig};

/// Build the configured embedder, wrapped in the query cache when enabled.
pub fn build_embedder(config: &RagConfig) -> Result<Arc<dyn Embedder>> {
    let base: Arc<dyn Embedder> = match config.embedding.provider {
        EmbeddingProvider::Hash => Arc::new(HashEmbedder::new(config.collection.dimensions)?),
        #[cfg(feature = "local-embeddings")]
        EmbeddingProvider::FastEmbed => {
            let model = config.embedding.model.parse()?;
            Arc::new(crate::rag::embeddings::FastEmbedEmbedder::new(model)?)
        }
        #[cfg(not(feature = "local-embeddings"))]
        EmbeddingProvider::FastEmbed => {
            return Err(AppError::ModelUnavailable(
                "the fastembed provider needs the `local-embeddings` feature".to_string(),
            ))
        }
    };

    if config.embedding.cache_size == 0 {
        return Ok(base);
    }
    Ok(Arc::new(CachedEmbedder::new(base, config.embedding.cache_size)))
}

/// Build the configured generation client.
pub fn build_llm(config: &RagConfig) -> Result<Arc<dyn LLMClient>> {
    #[cfg(feature = "ollama")]
    {
        let client = crate::llm::OllamaClient::new(
            config.generation.base_url.clone(),
            config.generation.model.clone(),
        )?;
        Ok(Arc::new(client))
    }
    #[cfg(not(feature = "ollama"))]
    {
        let _ = config;
        Err(AppError::Configuration(
            "no generation provider compiled in; enable the `ollama` feature".to_string(),
        ))
    }
}

/// Read one document per non-empty line.
pub fn read_documents(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::InvalidArgument(format!("cannot read {}: {}", path.display(), e))
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Long-lived components shared by every command.
pub struct Components {
    pub config: RagConfig,
    pub store: Arc<dyn VectorStore>,
    pub embedder: Arc<dyn Embedder>,
}

impl Components {
    /// Open the store and load the embedder.
    pub async fn build(config: RagConfig) -> Result<Self> {
        let provider = VectorStoreProvider::Embedded {
            path: config.store.path.clone(),
            require_load: config.store.require_load,
        };
        let store = provider.create_store().await?;
        let embedder = build_embedder(&config)?;
        debug!(
            store = store.provider_name(),
            embedder = embedder.model_name(),
            "Components ready"
        );
        Ok(Self {
            config,
            store,
            embedder,
        })
    }

    /// Assemble from parts already built.
    pub fn from_parts(
        config: RagConfig,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            config,
            store,
            embedder,
        }
    }

    fn collection(&self) -> &str {
        &self.config.collection.name
    }

    async fn require_collection(&self) -> Result<()> {
        if self.store.collection_exists(self.collection()).await? {
            Ok(())
        } else {
            Err(AppError::Configuration(format!(
                "collection '{}' does not exist; run `ragkit init` first",
                self.collection()
            )))
        }
    }

    /// Connect a retriever to the configured collection.
    pub async fn retriever(&self) -> Result<Retriever> {
        Retriever::connect(
            Arc::clone(&self.embedder),
            Arc::clone(&self.store),
            self.config.retriever_config(),
        )
        .await
    }

    /// Build the full pipeline around `llm`.
    pub async fn pipeline(&self, llm: Arc<dyn LLMClient>) -> Result<RagPipeline> {
        let retrieval = &self.config.retrieval;
        let mut pipeline = RagPipeline::new(self.retriever().await?, llm)
            .with_assembler(ContextAssembler::new(retrieval.separator.clone()))
            .with_top_k(retrieval.top_k)
            .with_max_context_chars(retrieval.max_context_chars);
        if let Some(template) = &self.config.generation.template {
            pipeline = pipeline.with_template(template.clone());
        }
        Ok(pipeline)
    }
}

/// Dispatch one parsed subcommand.
pub async fn run(command: Commands, components: &Components, output: &Output) -> Result<()> {
    match command {
        Commands::Init => run_init(components, output).await,
        Commands::Ingest { texts, file } => {
            let mut documents = texts;
            if let Some(path) = file {
                documents.extend(read_documents(&path)?);
            }
            run_ingest(components, &documents, output).await
        }
        Commands::Index => run_index(components, output).await,
        Commands::Query { question, k } => run_query(components, &question, k, output).await,
        Commands::Ask { question, k } => {
            let llm = build_llm(&components.config)?;
            run_ask(components, llm, &question, k, output).await
        }
        Commands::Stats => run_stats(components, output).await,
        Commands::Drop { yes } => run_drop(components, yes, output).await,
    }
}

pub async fn run_init(components: &Components, output: &Output) -> Result<()> {
    let schema = components.config.schema();
    match components.store.create_collection(schema.clone()).await {
        Ok(()) => {
            info!(collection = %schema.name, "Collection created");
            output.success(&format!(
                "Created collection '{}' ({} dims, {})",
                schema.name, schema.dimensions, schema.metric
            ));
            if components.config.store.path.is_none() {
                output.hint("store.path is not set; the collection lives in memory only");
            }
            Ok(())
        }
        Err(AppError::AlreadyExists(_)) => {
            output.warning(&format!("Collection '{}' already exists", schema.name));
            Ok(())
        }
        Err(e) => Err(e),
    }
}

pub async fn run_ingest(components: &Components, texts: &[String], output: &Output) -> Result<()> {
    if texts.is_empty() {
        return Err(AppError::InvalidArgument(
            "nothing to ingest; pass TEXT arguments or --file".to_string(),
        ));
    }
    components.require_collection().await?;

    let report = ingest_texts(
        components.embedder.as_ref(),
        components.store.as_ref(),
        components.collection(),
        texts,
    )
    .await?;

    let ids: Vec<String> = report.inserted.iter().map(|id| id.to_string()).collect();
    output.success(&format!(
        "Ingested {} document(s) into '{}'",
        report.inserted.len(),
        components.collection()
    ));
    output.kv("ids", &ids.join(", "));
    Ok(())
}

pub async fn run_index(components: &Components, output: &Output) -> Result<()> {
    let params = components.config.index_params();
    let build = components
        .store
        .build_index(components.collection(), components.config.collection.metric, params)
        .await?;
    match build {
        IndexBuild::Built { documents } => output.success(&format!(
            "Built HNSW index over {} document(s) (m={}, ef_construction={})",
            documents, params.m, params.ef_construction
        )),
        IndexBuild::Unchanged => output.info("Index is already up to date"),
    }
    Ok(())
}

pub async fn run_query(
    components: &Components,
    question: &str,
    k: Option<usize>,
    output: &Output,
) -> Result<()> {
    let retriever = components.retriever().await?;
    let k = k.unwrap_or(components.config.retrieval.top_k);
    let passages = retriever.retrieve(question, k).await?;
    output.passages(&format!("Top {} for \"{}\"", passages.len(), question.trim()), &passages);
    Ok(())
}

pub async fn run_ask(
    components: &Components,
    llm: Arc<dyn LLMClient>,
    question: &str,
    k: Option<usize>,
    output: &Output,
) -> Result<()> {
    let mut pipeline = components.pipeline(llm).await?;
    if let Some(k) = k {
        pipeline = pipeline.with_top_k(k);
    }

    match pipeline.ask(question).await {
        Ok(answer) => {
            output.answer(&answer.model, &answer.answer);
            output.passages("Sources", &answer.passages);
            Ok(())
        }
        Err(AppError::UpstreamGeneration { message, passages }) => {
            if !passages.is_empty() {
                output.passages("Retrieved (generation failed)", &passages);
            }
            Err(AppError::UpstreamGeneration { message, passages })
        }
        Err(e) => Err(e),
    }
}

pub async fn run_stats(components: &Components, output: &Output) -> Result<()> {
    let stats = components.store.describe(components.collection()).await?;
    output.stats(&stats);
    Ok(())
}

pub async fn run_drop(components: &Components, yes: bool, output: &Output) -> Result<()> {
    components.require_collection().await?;
    let name = components.collection();
    if !yes && !output.confirm(&format!("Drop collection '{}' and all its documents?", name)) {
        output.info("Aborted");
        return Ok(());
    }
    components.store.drop_collection(name).await?;
    output.success(&format!("Dropped collection '{}'", name));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_documents_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "first doc\n\n   \n  second doc  ").unwrap();
        let docs = read_documents(file.path()).unwrap();
        assert_eq!(docs, vec!["first doc".to_string(), "second doc".to_string()]);
    }

    #[test]
    fn test_read_documents_missing_file() {
        let err = read_documents(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[test]
    fn test_build_hash_embedder_with_cache() {
        let mut config = RagConfig::default();
        config.embedding.provider = EmbeddingProvider::Hash;
        config.collection.dimensions = 32;

        let embedder = build_embedder(&config).unwrap();
        assert_eq!(embedder.dimensions(), 32);
        assert_eq!(embedder.model_name(), "feature-hash-32");

        config.embedding.cache_size = 0;
        assert_eq!(build_embedder(&config).unwrap().dimensions(), 32);
    }

    #[tokio::test]
    async fn test_init_ingest_query_stats_drop() {
        let mut config = RagConfig::default();
        config.embedding.provider = EmbeddingProvider::Hash;
        config.collection.dimensions = 64;
        let components = Components::build(config).await.unwrap();
        let output = Output::no_color();

        let missing = run_ingest(&components, &["x".to_string()], &output).await;
        assert!(matches!(missing, Err(AppError::Configuration(_))));

        run_init(&components, &output).await.unwrap();
        run_init(&components, &output).await.unwrap();

        let texts = vec![
            "rust ownership and borrowing".to_string(),
            "python garbage collection".to_string(),
        ];
        run_ingest(&components, &texts, &output).await.unwrap();
        assert_eq!(components.store.describe("documents").await.unwrap().document_count, 2);

        run_query(&components, "ownership in rust", Some(1), &output)
            .await
            .unwrap();
        run_index(&components, &output).await.unwrap();
        run_stats(&components, &output).await.unwrap();

        run_drop(&components, true, &output).await.unwrap();
        assert!(!components.store.collection_exists("documents").await.unwrap());
    }

    #[tokio::test]
    async fn test_ingest_nothing_is_bad_input() {
        let mut config = RagConfig::default();
        config.embedding.provider = EmbeddingProvider::Hash;
        let components = Components::build(config).await.unwrap();
        let err = run_ingest(&components, &[], &Output::no_color()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }
}
