//! Seeded FAQ retriever.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use rag_core::{Embedder, FaqEntry, Point, RagError, Result, SearchHit, VectorStore};

use crate::dataset::duplicate_id;

/// Number of blocks returned when the caller does not say otherwise.
pub const DEFAULT_TOP_K: usize = 3;

/// Semantic search over a seeded FAQ collection.
///
/// The store is seeded once in [`Retriever::new`]; afterwards the retriever
/// only reads, so it can be shared behind an `Arc` by concurrent tool calls.
pub struct Retriever {
    /// Vector collection holding the seeded entries.
    store: Arc<dyn VectorStore>,

    /// Embedding model, shared by seeding and queries.
    embedder: Arc<dyn Embedder>,

    /// Number of entries seeded.
    seeded: usize,
}

impl Retriever {
    /// Create a retriever and seed `entries` into the store.
    ///
    /// Every failure is reported as [`RagError::Seed`].
    pub async fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        entries: Vec<FaqEntry>,
    ) -> Result<Self> {
        let start = Instant::now();

        let seeded = seed(store.as_ref(), embedder.as_ref(), entries)
            .await
            .map_err(|e| match e {
                RagError::Seed { .. } => e,
                other => RagError::seed(other.to_string()),
            })?;

        info!(
            "Seeded {} entries into '{}' in {}ms",
            seeded,
            store.collection(),
            start.elapsed().as_millis()
        );

        Ok(Self {
            store,
            embedder,
            seeded,
        })
    }

    /// Number of entries seeded at construction.
    pub fn seeded(&self) -> usize {
        self.seeded
    }

    /// Top-`k` hits for `query`, best first.
    pub async fn search_hits(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        debug!("Retrieving top {} for: {:?}", k, query);

        let vector = self.embedder.encode(query).await?;
        self.store.search(&vector, k).await
    }

    /// Top-`k` entries for `query` as text blocks separated by a blank line.
    ///
    /// Returns an empty string when nothing matches.
    pub async fn search(&self, query: &str, k: usize) -> Result<String> {
        let hits = self.search_hits(query, k).await?;
        Ok(format_hits(&hits))
    }
}

async fn seed(store: &dyn VectorStore, embedder: &dyn Embedder, entries: Vec<FaqEntry>) -> Result<usize> {
    if let Some(id) = duplicate_id(&entries) {
        return Err(RagError::seed(format!("Duplicate entry id {}", id)));
    }

    if embedder.dimension() != store.dimension() {
        return Err(RagError::seed(format!(
            "Embedding dimension {} does not match collection '{}' dimension {}",
            embedder.dimension(),
            store.collection(),
            store.dimension()
        )));
    }

    if entries.is_empty() {
        return Ok(0);
    }

    let texts: Vec<String> = entries.iter().map(FaqEntry::document_text).collect();
    let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let vectors = embedder.encode_batch(&text_refs).await?;

    if vectors.len() != entries.len() {
        return Err(RagError::seed(format!(
            "Embedder returned {} vectors for {} entries",
            vectors.len(),
            entries.len()
        )));
    }

    let points: Vec<Point> = entries
        .into_iter()
        .zip(vectors)
        .map(|(entry, vector)| Point::new(entry.id, vector, entry))
        .collect();

    store.upsert(&points).await?;
    Ok(points.len())
}

/// Render hits as `Q: ..\nA: ..\n(score=..)` blocks joined by a blank line.
pub fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| {
            format!(
                "Q: {}\nA: {}\n(score={:.4})",
                hit.payload.question, hit.payload.answer, hit.score
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
