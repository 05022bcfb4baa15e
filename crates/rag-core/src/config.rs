//! Configuration types for the RAG system.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the RAG system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Tool server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Embedding configuration.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector store configuration.
    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    /// Retrieval configuration.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Web search configuration.
    #[serde(default)]
    pub web_search: WebSearchConfig,
}

/// Tool server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server name reported to MCP clients.
    #[serde(default = "default_server_name")]
    pub name: String,

    /// Bind address for the HTTP transport.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port for the HTTP transport.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Keep per-client MCP sessions (streamable HTTP stateful mode).
    #[serde(default = "default_true")]
    pub stateful_sessions: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            host: default_host(),
            port: default_port(),
            stateful_sessions: true,
        }
    }
}

impl ServerConfig {
    /// `host:port` string for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Which embedder implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// Pre-trained sentence-transformer exported to ONNX.
    Onnx,
    /// Feature-hashing embedder that needs no model files.
    Hashing,
}

/// Embedding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedder implementation.
    #[serde(default = "default_backend")]
    pub backend: EmbeddingBackend,

    /// Directory holding `model.onnx` and `tokenizer.json`.
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Vector dimension. Probed from the model when not set.
    #[serde(default)]
    pub dimension: Option<usize>,

    /// Maximum tokens per input; longer inputs are truncated.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Number of threads for CPU inference.
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,

    /// Feed `token_type_ids` to the model (BERT-style exports need it).
    #[serde(default = "default_true")]
    pub token_type_ids: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            model_path: default_model_path(),
            dimension: None,
            max_tokens: 256,
            num_threads: 4,
            token_type_ids: true,
        }
    }
}

/// Vector store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// Collection name; recreated on every start.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// SQLite database file. In-memory when not set.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            path: None,
        }
    }
}

/// Retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of FAQ blocks returned per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// JSON file with `[{id, question, answer}, ...]` to seed instead of
    /// the built-in dataset.
    #[serde(default)]
    pub dataset_path: Option<PathBuf>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            dataset_path: None,
        }
    }
}

/// Web search provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchProvider {
    /// Bright Data SERP proxy (Google results as JSON).
    BrightData,
    /// Serper.dev search API.
    Serper,
}

/// Web search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    /// Provider to call.
    #[serde(default = "default_provider")]
    pub provider: SearchProvider,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Result count used when the caller gives none.
    #[serde(default = "default_num_results")]
    pub default_num_results: usize,

    /// Search URL requested through the Bright Data proxy.
    #[serde(default = "default_bright_data_endpoint")]
    pub bright_data_endpoint: String,

    /// Serper.dev search endpoint.
    #[serde(default = "default_serper_endpoint")]
    pub serper_endpoint: String,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            timeout_secs: 30,
            default_num_results: 10,
            bright_data_endpoint: default_bright_data_endpoint(),
            serper_endpoint: default_serper_endpoint(),
        }
    }
}

// Default value functions

fn default_true() -> bool {
    true
}

fn default_server_name() -> String {
    "MCP-RAG-app".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_backend() -> EmbeddingBackend {
    EmbeddingBackend::Onnx
}

fn default_max_tokens() -> usize {
    256
}

fn default_num_threads() -> usize {
    4
}

fn default_collection() -> String {
    "ml_faq_collection".to_string()
}

fn default_top_k() -> usize {
    3
}

fn default_provider() -> SearchProvider {
    SearchProvider::BrightData
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_num_results() -> usize {
    10
}

fn default_bright_data_endpoint() -> String {
    "https://www.google.com/search".to_string()
}

fn default_serper_endpoint() -> String {
    "https://google.serper.dev/search".to_string()
}

fn default_model_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rag-mcp")
        .join("models")
        .join("all-MiniLM-L6-v2")
}

impl RagConfig {
    /// Load configuration from file.
    pub fn load(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> crate::error::Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::error::RagError::config(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from default paths.
    pub fn load_default() -> crate::error::Result<Self> {
        // Try user config first
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("rag-mcp").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        // Try local config
        let local_config = PathBuf::from("rag-mcp.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        // Return defaults
        Ok(Self::default())
    }
}
