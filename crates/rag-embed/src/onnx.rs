//! ONNX-based sentence embedding model.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ndarray::ArrayViewD;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use rag_core::{Embedder, EmbeddingConfig, RagError, Result};

/// Text encoded once at load time when the dimension is not configured.
const DIMENSION_PROBE: &str = "dimension probe";

/// Model file expected inside the model directory.
pub const MODEL_FILE: &str = "model.onnx";

/// Tokenizer file expected inside the model directory.
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// ONNX-based embedder for sentence-transformer models such as
/// all-MiniLM-L6-v2.
///
/// Token embeddings are mean-pooled over the attention mask and
/// L2-normalized, matching the sentence-transformers pooling head.
pub struct OnnxEmbedder {
    /// ONNX inference session, shared with blocking inference tasks.
    session: Arc<Mutex<Session>>,

    /// Tokenizer for the model.
    tokenizer: Arc<Tokenizer>,

    /// Embedding dimension, fixed at load time.
    dimension: usize,

    /// Maximum token count per input.
    max_tokens: usize,

    /// Whether the model takes a `token_type_ids` input.
    token_type_ids: bool,
}

impl OnnxEmbedder {
    /// Load `model.onnx` and `tokenizer.json` from the configured model
    /// directory.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        Self::new(
            config.model_path.join(MODEL_FILE),
            config.model_path.join(TOKENIZER_FILE),
            config,
        )
    }

    /// Create a new embedder from model and tokenizer paths.
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX model file
    /// * `tokenizer_path` - Path to the tokenizer.json file
    /// * `config` - Threads, truncation and dimension settings
    pub fn new(
        model_path: impl AsRef<Path>,
        tokenizer_path: impl AsRef<Path>,
        config: &EmbeddingConfig,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            return Err(RagError::embedding(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }

        info!("Loading ONNX model from {:?}", model_path);

        let session = Session::builder()
            .map_err(|e| RagError::embedding(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| RagError::embedding(format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(config.num_threads)
            .map_err(|e| RagError::embedding(format!("Failed to set thread count: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| RagError::embedding(format!("Failed to load model: {}", e)))?;

        info!("Loading tokenizer from {:?}", tokenizer_path);

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| RagError::embedding(format!("Failed to load tokenizer: {}", e)))?;

        let session = Arc::new(Mutex::new(session));
        let tokenizer = Arc::new(tokenizer);

        let dimension = match config.dimension {
            Some(dimension) => dimension,
            None => {
                let probe = run_batch(
                    &session,
                    &tokenizer,
                    &[DIMENSION_PROBE],
                    config.max_tokens,
                    config.token_type_ids,
                )?;
                probe
                    .first()
                    .map(|v| v.len())
                    .ok_or_else(|| RagError::embedding("Empty probe embedding"))?
            }
        };

        if dimension == 0 {
            return Err(RagError::embedding("Model produced zero-length embeddings"));
        }

        info!(
            "Embedder initialized: dim={}, max_tokens={}",
            dimension, config.max_tokens
        );

        Ok(Self {
            session,
            tokenizer,
            dimension,
            max_tokens: config.max_tokens,
            token_type_ids: config.token_type_ids,
        })
    }
}

#[async_trait]
impl Embedder for OnnxEmbedder {
    async fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let session = self.session.clone();
        let tokenizer = self.tokenizer.clone();
        let texts: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let max_tokens = self.max_tokens;
        let token_type_ids = self.token_type_ids;

        let embeddings = tokio::task::spawn_blocking(move || {
            let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
            run_batch(&session, &tokenizer, &refs, max_tokens, token_type_ids)
        })
        .await
        .map_err(|e| RagError::embedding(format!("Embedding task failed: {}", e)))??;

        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimension) {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Tokenize and run one batch through the model.
fn run_batch(
    session: &Mutex<Session>,
    tokenizer: &Tokenizer,
    texts: &[&str],
    max_tokens: usize,
    token_type_ids: bool,
) -> Result<Vec<Vec<f32>>> {
    let encodings = tokenizer
        .encode_batch(texts.to_vec(), true)
        .map_err(|e| RagError::embedding(format!("Tokenization failed: {}", e)))?;

    // Get max length for padding
    let max_len = encodings
        .iter()
        .map(|e| e.get_ids().len())
        .max()
        .unwrap_or(0)
        .min(max_tokens);

    let batch_size = encodings.len();

    debug!("Embedding batch: size={}, max_len={}", batch_size, max_len);

    let mut input_ids = vec![0i64; batch_size * max_len];
    let mut attention_mask = vec![0i64; batch_size * max_len];

    for (i, encoding) in encodings.iter().enumerate() {
        let ids = encoding.get_ids();
        let mask = encoding.get_attention_mask();
        let len = ids.len().min(max_len);

        for j in 0..len {
            input_ids[i * max_len + j] = ids[j] as i64;
            attention_mask[i * max_len + j] = mask[j] as i64;
        }
    }

    let input_ids_tensor = Tensor::from_array((vec![batch_size, max_len], input_ids))
        .map_err(|e| RagError::embedding(format!("Failed to create input tensor: {}", e)))?;

    let attention_mask_tensor = Tensor::from_array((vec![batch_size, max_len], attention_mask))
        .map_err(|e| RagError::embedding(format!("Failed to create mask tensor: {}", e)))?;

    let mut session = session
        .lock()
        .map_err(|e| RagError::embedding(format!("Failed to lock session: {}", e)))?;

    let outputs = if token_type_ids {
        let token_type_tensor =
            Tensor::from_array((vec![batch_size, max_len], vec![0i64; batch_size * max_len]))
                .map_err(|e| {
                    RagError::embedding(format!("Failed to create token type tensor: {}", e))
                })?;
        session.run(ort::inputs![
            "input_ids" => input_ids_tensor,
            "attention_mask" => attention_mask_tensor,
            "token_type_ids" => token_type_tensor
        ])
    } else {
        session.run(ort::inputs![
            "input_ids" => input_ids_tensor,
            "attention_mask" => attention_mask_tensor
        ])
    }
    .map_err(|e| RagError::embedding(format!("Inference failed: {}", e)))?;

    // The first output is either token embeddings (batch, seq, hidden)
    // or an already pooled sentence embedding (batch, hidden).
    let (_, output) = outputs
        .iter()
        .next()
        .ok_or_else(|| RagError::embedding("No output tensor found"))?;

    let view = output
        .try_extract_array::<f32>()
        .map_err(|e| RagError::embedding(format!("Failed to extract tensor: {}", e)))?;

    let shape_dims: Vec<usize> = view.shape().to_vec();
    debug!("Output shape: {:?}", shape_dims);

    match shape_dims.len() {
        3 => {
            let masks: Vec<&[u32]> = encodings.iter().map(|e| e.get_attention_mask()).collect();
            Ok(mean_pool(&view, &masks, max_len))
        }
        2 => Ok(normalize_rows(&view)),
        _ => Err(RagError::embedding(format!(
            "Unexpected output shape: {:?}",
            shape_dims
        ))),
    }
}

/// Mean pooling over the sequence dimension, counting only attended tokens.
///
/// `masks` holds one attention mask per batch row. A row with no attended
/// tokens pools to the zero vector.
fn mean_pool(tensor: &ArrayViewD<'_, f32>, masks: &[&[u32]], max_len: usize) -> Vec<Vec<f32>> {
    let shape = tensor.shape();
    let seq_len = shape[1];
    let hidden_dim = shape[2];

    masks
        .iter()
        .enumerate()
        .map(|(i, attention_mask)| {
            let mut sum = vec![0.0f32; hidden_dim];
            let mut valid = 0usize;

            for (j, &m) in attention_mask.iter().take(max_len.min(seq_len)).enumerate() {
                if m != 1 {
                    continue;
                }
                valid += 1;
                for (k, s) in sum.iter_mut().enumerate() {
                    *s += tensor[[i, j, k]];
                }
            }

            if valid == 0 {
                return sum;
            }

            l2_normalize(sum.into_iter().map(|s| s / valid as f32).collect())
        })
        .collect()
}

/// L2-normalize each row of an already pooled `(batch, hidden)` output.
fn normalize_rows(tensor: &ArrayViewD<'_, f32>) -> Vec<Vec<f32>> {
    let shape = tensor.shape();
    let (batch_size, hidden_dim) = (shape[0], shape[1]);

    (0..batch_size)
        .map(|i| l2_normalize((0..hidden_dim).map(|j| tensor[[i, j]]).collect()))
        .collect()
}

/// L2 normalize a vector.
pub(crate) fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}
