//! rag-query - FAQ retrieval
//!
//! This crate seeds a vector collection with question/answer pairs and
//! answers natural-language queries with the closest entries.
//!
//! # Example
//!
//! ```rust,ignore
//! use rag_query::{ml_faq, Retriever};
//! use std::sync::Arc;
//!
//! let retriever = Retriever::new(Arc::new(store), Arc::new(embedder), ml_faq()).await?;
//! let context = retriever.search("What is overfitting?", 3).await?;
//! ```

mod dataset;
mod retriever;

pub use dataset::{dataset_from_config, load_dataset, ml_faq};
pub use retriever::{format_hits, Retriever, DEFAULT_TOP_K};

// Re-export for convenience
pub use rag_core::{FaqEntry, SearchHit};
