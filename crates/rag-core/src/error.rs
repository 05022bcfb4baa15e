//! Error types for the RAG system.

use thiserror::Error;

/// Result type alias using RagError.
pub type Result<T> = std::result::Result<T, RagError>;

/// Errors that can occur in the RAG system.
#[derive(Error, Debug)]
pub enum RagError {
    /// Invalid argument provided.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// No tool registered under this name.
    #[error("Tool not found: {name}")]
    ToolNotFound { name: String },

    /// Web search credentials absent from the environment.
    #[error("Missing credentials: set {} in your environment (.env)", variables.join(", "))]
    MissingCredentials { variables: Vec<String> },

    /// The web search provider could not be reached or answered garbage.
    #[error("Upstream search failure: {message}")]
    UpstreamSearch { message: String },

    /// Seeding the vector store failed; the retriever cannot serve.
    #[error("Seed failure: {message}")]
    Seed { message: String },

    /// Vector length does not match the collection dimension.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Database error.
    #[error("Database error: {message}")]
    Database { message: String },

    /// Embedding model error.
    #[error("Embedding error: {message}")]
    Embedding { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RagError {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a missing credentials error naming the absent variables.
    pub fn missing_credentials<I, S>(variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MissingCredentials {
            variables: variables.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an upstream search error.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamSearch {
            message: message.into(),
        }
    }

    /// Create a seed error.
    pub fn seed(message: impl Into<String>) -> Self {
        Self::Seed {
            message: message.into(),
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the error was caused by the caller's arguments rather than
    /// by the tool while running.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. } | Self::ToolNotFound { .. })
    }

    /// Get the error code for MCP responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::ToolNotFound { .. } => "TOOL_NOT_FOUND",
            Self::MissingCredentials { .. } => "MISSING_CREDENTIALS",
            Self::UpstreamSearch { .. } => "UPSTREAM_SEARCH_FAILURE",
            Self::Seed { .. } => "SEED_FAILURE",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::Database { .. } => "DATABASE_ERROR",
            Self::Embedding { .. } => "EMBEDDING_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_names_variables() {
        let err = RagError::missing_credentials(["BRIGHT_DATA_USERNAME", "BRIGHT_DATA_PASSWORD"]);
        let msg = err.to_string();
        assert!(msg.contains("BRIGHT_DATA_USERNAME"));
        assert!(msg.contains("BRIGHT_DATA_PASSWORD"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            RagError::invalid_argument("query must be a string").error_code(),
            "INVALID_ARGUMENT"
        );
        assert_eq!(RagError::upstream("timeout").error_code(), "UPSTREAM_SEARCH_FAILURE");
        assert_eq!(RagError::seed("boom").error_code(), "SEED_FAILURE");
        assert_eq!(
            RagError::DimensionMismatch {
                expected: 384,
                actual: 3
            }
            .error_code(),
            "DIMENSION_MISMATCH"
        );
    }

    #[test]
    fn test_caller_errors() {
        assert!(RagError::invalid_argument("x").is_caller_error());
        assert!(RagError::ToolNotFound {
            name: "nope".to_string()
        }
        .is_caller_error());
        assert!(!RagError::missing_credentials(["SERPER_API_KEY"]).is_caller_error());
    }
}
