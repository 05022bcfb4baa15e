//! Core traits defining the interfaces between components.

use async_trait::async_trait;

use crate::error::{RagError, Result};
use crate::types::{Point, SearchHit, WebResult};

/// Embedding model trait.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per text, in input order.
    async fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        self.encode_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::embedding("No embedding returned"))
    }

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;
}

/// Vector collection with cosine similarity search.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Name of the collection this store writes to.
    fn collection(&self) -> &str;

    /// Vector length the collection was created with.
    fn dimension(&self) -> usize;

    /// Insert points, overwriting any point with the same id.
    async fn upsert(&self, points: &[Point]) -> Result<()>;

    /// Return the `limit` most similar points, best first.
    ///
    /// The order of hits with equal scores is unspecified.
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>>;

    /// Number of points in the collection.
    async fn count(&self) -> Result<usize>;
}

/// A web search provider.
#[async_trait]
pub trait WebSearchPort: Send + Sync {
    /// Provider name used in logs.
    fn provider(&self) -> &'static str;

    /// Run a query and return at most `num_results` organic results.
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<WebResult>>;
}
