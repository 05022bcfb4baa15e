//! Shared application state built once at startup.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use rag_core::{RagConfig, Result, VectorStore, WebSearchPort};
use rag_query::{dataset_from_config, Retriever};
use rag_store::SqliteVectorStore;

/// Everything the tools need, read-only after construction.
pub struct AppContext {
    pub config: RagConfig,
    pub retriever: Arc<Retriever>,
    pub web_search: Arc<dyn WebSearchPort>,
}

impl AppContext {
    pub fn new(config: RagConfig, retriever: Arc<Retriever>, web_search: Arc<dyn WebSearchPort>) -> Self {
        Self {
            config,
            retriever,
            web_search,
        }
    }

    /// Build the embedder, store and web search provider from the
    /// configuration and seed the FAQ collection.
    ///
    /// Seeding completes before this returns; a failure is fatal.
    pub async fn build(config: RagConfig) -> Result<Self> {
        let start = Instant::now();

        let embedder = rag_embed::from_config(&config.embedding)?;
        let store: Arc<dyn VectorStore> = Arc::new(SqliteVectorStore::from_config(
            &config.vector_store,
            embedder.dimension(),
        )?);

        let entries = dataset_from_config(&config.retrieval)?;
        let retriever = Retriever::new(store, embedder, entries).await?;

        let web_search = rag_web::from_config(&config.web_search);

        info!(
            "Context ready in {}ms: {} FAQ entries, web search via {}",
            start.elapsed().as_millis(),
            retriever.seeded(),
            web_search.provider()
        );

        Ok(Self::new(config, Arc::new(retriever), web_search))
    }
}
