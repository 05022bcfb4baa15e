//! rag-embed - Sentence embedding models
//!
//! This crate provides text embeddings for semantic similarity search.
//!
//! # Backends
//!
//! - [`OnnxEmbedder`]: a pre-trained sentence-transformer (all-MiniLM-L6-v2
//!   by default) run with ONNX Runtime, mean pooling with attention mask and
//!   L2 normalization
//! - [`HashingEmbedder`]: deterministic feature hashing, no model files

mod hashing;
mod onnx;

use std::sync::Arc;

use tracing::info;

pub use hashing::{HashingEmbedder, DEFAULT_DIMENSION};
pub use onnx::{OnnxEmbedder, MODEL_FILE, TOKENIZER_FILE};

// Re-export the Embedder trait for convenience
pub use rag_core::Embedder;

use rag_core::{EmbeddingBackend, EmbeddingConfig, Result};

/// Build the embedder selected by the configuration.
pub fn from_config(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.backend {
        EmbeddingBackend::Onnx => Ok(Arc::new(OnnxEmbedder::from_config(config)?)),
        EmbeddingBackend::Hashing => {
            let dimension = config.dimension.unwrap_or(DEFAULT_DIMENSION);
            info!("Using hashing embedder: dim={}", dimension);
            Ok(Arc::new(HashingEmbedder::with_dimension(dimension)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_hashing() {
        let config = EmbeddingConfig {
            backend: EmbeddingBackend::Hashing,
            dimension: Some(128),
            ..Default::default()
        };

        let embedder = from_config(&config).unwrap();
        assert_eq!(embedder.dimension(), 128);
    }

    #[test]
    fn test_from_config_onnx_without_model() {
        let dir = tempfile::tempdir().unwrap();
        let config = EmbeddingConfig {
            backend: EmbeddingBackend::Onnx,
            model_path: dir.path().join("missing"),
            ..Default::default()
        };

        assert!(from_config(&config).is_err());
    }
}
